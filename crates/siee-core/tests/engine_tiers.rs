//! # Engine Tier Tests (T0-T4)
//!
//! End-to-end checks of the documented engine behaviour, leaves first.
//!
//! ## Tiers
//! - T0: Scale Classification
//! - T1: Period Aggregation
//! - T2: Area Aggregation
//! - T3: Promotion & Recovery
//! - T4: Full Pipeline & Gating

use siee_core::{
    AcademicLevel, ApprovalCriteria, AreaAggregator, AreaConfig, AreaId, AreaType,
    CalculationMethod, ComponentAggregator, EvaluationProcess, GradingConfig, GradingScale,
    LevelId, PerformanceLevel, ProcessCode, RecoveryType, SieeError, SubjectGrade, SubjectId,
    Subprocess,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn band(code: &str, min: f64, max: f64, order: u8, approved: bool) -> PerformanceLevel {
    PerformanceLevel {
        code: code.to_string(),
        min_score: min,
        max_score: max,
        order,
        is_approved: approved,
    }
}

fn secondary() -> AcademicLevel {
    AcademicLevel {
        id: LevelId(2),
        name: "Secundaria".to_string(),
        min_grade: 1.0,
        max_grade: 5.0,
        min_passing_grade: 3.0,
        scale: GradingScale::Numeric {
            performance_levels: vec![
                band("SUPERIOR", 4.5, 5.0, 1, true),
                band("ALTO", 4.0, 4.4, 2, true),
                band("BASICO", 3.0, 3.9, 3, true),
                band("BAJO", 1.0, 2.9, 4, false),
            ],
        },
    }
}

fn process(code: &str, weight: f64) -> EvaluationProcess {
    EvaluationProcess {
        code: ProcessCode::new(code),
        name: String::new(),
        weight_percentage: weight,
        subprocesses: vec![Subprocess {
            order: 1,
            weight_percentage: 100.0,
            number_of_grades: 4,
        }],
        allow_teacher_add_grades: false,
    }
}

fn three_processes() -> GradingConfig {
    GradingConfig {
        processes: vec![
            process("COGNITIVO", 40.0),
            process("PROCEDIMENTAL", 40.0),
            process("ACTITUDINAL", 20.0),
        ],
        use_final_components: false,
    }
}

fn subject(id: u64, grade: f64, weight: f64, dominant: bool) -> SubjectGrade {
    SubjectGrade {
        subject: SubjectId(id),
        grade,
        weight_percentage: weight,
        is_dominant: dominant,
        qualitative_approval: None,
    }
}

fn area_config(method: CalculationMethod, criteria: ApprovalCriteria) -> AreaConfig {
    AreaConfig {
        area_type: AreaType::Evaluable,
        calculation_method: method,
        approval_criteria: criteria,
        recovery_type: RecoveryType::BySubject,
        fail_if_any_subject_fails: false,
    }
}

// =============================================================================
// TIER T0: SCALE CLASSIFICATION
// =============================================================================

mod t0_scale_classification {
    use super::*;
    use siee_core::{Classification, ScaleClassifier};

    /// T0.1: Contiguous bands: 4.0 is the lower bound of ALTO.
    #[test]
    fn lower_bound_of_higher_band_wins() {
        let level = secondary();
        let classifier = ScaleClassifier::new(&level);
        assert_eq!(classifier.classify(4.0).code(), Some("ALTO"));
    }

    /// T0.2: Out-of-range scores are unclassified, not errors.
    #[test]
    fn out_of_range_is_unclassified() {
        let level = secondary();
        let classifier = ScaleClassifier::new(&level);
        assert_eq!(classifier.classify(0.0), Classification::Unclassified);
        assert_eq!(classifier.classify(5.01), Classification::Unclassified);
    }
}

// =============================================================================
// TIER T1: PERIOD AGGREGATION
// =============================================================================

mod t1_period_aggregation {
    use super::*;
    use siee_core::PeriodScores;

    /// T1.1: 4.0×0.4 + 3.5×0.4 + 5.0×0.2 = 4.0
    #[test]
    fn three_process_period_grade() {
        let grading = three_processes();
        let mut scores = PeriodScores::new();
        scores.push("COGNITIVO", 1, 0, 4.0);
        scores.push("PROCEDIMENTAL", 1, 0, 3.0);
        scores.push("PROCEDIMENTAL", 1, 1, 4.0);
        scores.push("ACTITUDINAL", 1, 0, 5.0);

        let breakdown = ComponentAggregator::new(&grading).aggregate(&scores);

        assert!(close(breakdown.process_average("COGNITIVO").expect("cog"), 4.0));
        assert!(close(breakdown.process_average("PROCEDIMENTAL").expect("proc"), 3.5));
        assert!(close(breakdown.grade, 4.0));
        assert!(breakdown.is_complete());
    }

    /// T1.2: An empty subprocess contributes 0 and drags the grade down.
    #[test]
    fn empty_process_drags_grade_down() {
        let grading = three_processes();
        let mut scores = PeriodScores::new();
        scores.push("COGNITIVO", 1, 0, 5.0);
        scores.push("PROCEDIMENTAL", 1, 0, 5.0);

        let breakdown = ComponentAggregator::new(&grading).aggregate(&scores);

        assert!(close(breakdown.grade, 4.0));
        assert!(!breakdown.is_complete());
        let empty: Vec<_> = breakdown.empty_subprocesses().collect();
        assert_eq!(empty, vec![(&ProcessCode::new("ACTITUDINAL"), 1)]);
    }

    /// T1.3: Zero means ungraded, not a zero grade.
    #[test]
    fn zero_scores_are_ignored() {
        let grading = three_processes();
        let mut scores = PeriodScores::new();
        for code in ["COGNITIVO", "PROCEDIMENTAL", "ACTITUDINAL"] {
            scores.push(code, 1, 0, 4.0);
            scores.push(code, 1, 1, 0.0);
        }

        let breakdown = ComponentAggregator::new(&grading).aggregate(&scores);
        assert!(close(breakdown.grade, 4.0));
    }
}

// =============================================================================
// TIER T2: AREA AGGREGATION
// =============================================================================

mod t2_area_aggregation {
    use super::*;

    /// T2.1: WEIGHTED [(60%, 4.0), (40%, 3.0)] = 3.6, approved at 3.0.
    #[test]
    fn weighted_area_approved() {
        let config = area_config(CalculationMethod::Weighted, ApprovalCriteria::AreaAverage);
        let outcome = AreaAggregator::new(&config, 3.0)
            .evaluate(
                AreaId(1),
                &[subject(1, 4.0, 60.0, false), subject(2, 3.0, 40.0, false)],
            )
            .expect("evaluate");
        assert!(close(outcome.average.expect("average"), 3.6));
        assert!(outcome.is_approved);
    }

    /// T2.2: Average exactly at the passing grade is approved.
    #[test]
    fn passing_grade_boundary_is_inclusive() {
        let config = area_config(CalculationMethod::Average, ApprovalCriteria::AreaAverage);
        let outcome = AreaAggregator::new(&config, 3.0)
            .evaluate(
                AreaId(1),
                &[subject(1, 3.5, 0.0, false), subject(2, 2.5, 0.0, false)],
            )
            .expect("evaluate");
        assert!(outcome.is_approved);
    }

    /// T2.3: DOMINANT without a flagged subject is an error, not NaN or 0.
    #[test]
    fn dominant_without_flag_errors() {
        let config = area_config(CalculationMethod::Dominant, ApprovalCriteria::AreaAverage);
        let result = AreaAggregator::new(&config, 3.0).evaluate(
            AreaId(4),
            &[subject(1, 4.0, 50.0, false), subject(2, 4.0, 50.0, false)],
        );
        assert_eq!(result, Err(SieeError::MissingDominantSubject(AreaId(4))));
    }

    /// T2.4: A failing subject overrides an approving area average.
    #[test]
    fn fail_if_any_subject_fails_has_final_say() {
        let mut config = area_config(CalculationMethod::Average, ApprovalCriteria::AreaAverage);
        config.fail_if_any_subject_fails = true;
        let outcome = AreaAggregator::new(&config, 3.0)
            .evaluate(
                AreaId(1),
                &[
                    subject(1, 4.0, 0.0, false),
                    subject(2, 3.6, 0.0, false),
                    subject(3, 2.0, 0.0, false),
                ],
            )
            .expect("evaluate");
        assert!(close(outcome.average.expect("average"), 3.2));
        assert!(!outcome.is_approved);
    }
}

// =============================================================================
// TIER T3: PROMOTION & RECOVERY
// =============================================================================

mod t3_promotion {
    use super::*;
    use siee_core::{
        AreaDecision, ConditionalPolicy, PromotionEvaluator, PromotionPolicy, PromotionStatus,
        RecoveryOutcome, apply_recovery,
    };
    use std::collections::BTreeMap;

    fn failing_area(recovery: RecoveryType) -> (AreaConfig, Vec<SubjectGrade>) {
        let mut config = area_config(CalculationMethod::Average, ApprovalCriteria::AllSubjects);
        config.recovery_type = recovery;
        (config, vec![subject(1, 4.5, 0.0, false), subject(2, 2.0, 0.0, false)])
    }

    /// T3.1: BySubject recovery re-aggregates and promotes.
    #[test]
    fn by_subject_recovery_promotes() {
        let (config, subjects) = failing_area(RecoveryType::BySubject);
        let aggregator = AreaAggregator::new(&config, 3.0);
        let outcome = aggregator.evaluate(AreaId(1), &subjects).expect("evaluate");
        let decision = AreaDecision::decided(outcome, true, RecoveryType::BySubject);

        let policy = PromotionPolicy::default();
        let before = PromotionEvaluator::new(&policy).evaluate(std::slice::from_ref(&decision));
        assert_eq!(before.status, PromotionStatus::PendingRecovery);

        let recovery = RecoveryOutcome::SubjectGrades(BTreeMap::from([(SubjectId(2), 3.0)]));
        let recovered =
            apply_recovery(&decision, &recovery, &subjects, &aggregator).expect("recover");
        let after = PromotionEvaluator::new(&policy).evaluate(&[recovered]);
        assert_eq!(after.status, PromotionStatus::Promoted);
    }

    /// T3.2: A pending council decision blocks by default, passes when tolerated.
    #[test]
    fn conditional_policy_is_configurable() {
        let (config, subjects) = failing_area(RecoveryType::Conditional);
        let outcome = AreaAggregator::new(&config, 3.0)
            .evaluate(AreaId(1), &subjects)
            .expect("evaluate");
        let decisions = [AreaDecision::decided(outcome, true, RecoveryType::Conditional)];

        let strict = PromotionPolicy::default();
        assert_eq!(
            PromotionEvaluator::new(&strict).evaluate(&decisions).status,
            PromotionStatus::PendingRecovery
        );

        let lenient = PromotionPolicy {
            conditional: ConditionalPolicy::Provisional,
            ..PromotionPolicy::default()
        };
        assert_eq!(
            PromotionEvaluator::new(&lenient).evaluate(&decisions).status,
            PromotionStatus::PromotedProvisionally
        );
    }
}

// =============================================================================
// TIER T4: FULL PIPELINE & GATING
// =============================================================================

mod t4_pipeline {
    use chrono::{DateTime, Utc};
    use siee_core::{
        InstitutionConfig, PromotionStatus, ScoreSheet, StudentId, SubjectId, YearState,
        evaluate_cohort, export_canonical, lifecycle, validate_institution, window,
    };

    const CONFIG: &str = r#"{
        "name": "Colegio San José",
        "year": {
            "name": "2025",
            "state": "DRAFT",
            "terms": [
                {"id": 1, "name": "P1", "weight_percentage": 50.0, "order": 1,
                 "open_at": "2025-02-01T00:00:00Z", "close_at": "2025-06-15T23:59:59Z"},
                {"id": 2, "name": "P2", "weight_percentage": 50.0, "order": 2,
                 "open_at": "2025-07-01T00:00:00Z", "close_at": "2025-11-30T23:59:59Z"}
            ]
        },
        "grading": {
            "processes": [
                {"code": "COGNITIVO", "weight_percentage": 60.0,
                 "subprocesses": [{"order": 1, "weight_percentage": 100.0, "number_of_grades": 3}]},
                {"code": "ACTITUDINAL", "weight_percentage": 40.0,
                 "subprocesses": [{"order": 1, "weight_percentage": 100.0, "number_of_grades": 1}]}
            ]
        },
        "levels": [
            {"id": 2, "name": "Secundaria", "min_grade": 1.0, "max_grade": 5.0,
             "min_passing_grade": 3.0,
             "scale": {"type": "NUMERIC", "performance_levels": [
                {"code": "SUPERIOR", "min_score": 4.5, "max_score": 5.0, "order": 1, "is_approved": true},
                {"code": "ALTO", "min_score": 4.0, "max_score": 4.4, "order": 2, "is_approved": true},
                {"code": "BASICO", "min_score": 3.0, "max_score": 3.9, "order": 3, "is_approved": true},
                {"code": "BAJO", "min_score": 1.0, "max_score": 2.9, "order": 4, "is_approved": false}
             ]}}
        ],
        "grades": [{"id": 6, "name": "6°", "level": 2}],
        "areas": [{"id": 1, "name": "Matemáticas", "order": 1}],
        "subjects": [
            {"id": 10, "name": "Aritmética", "area": 1, "weight_percentage": 60.0},
            {"id": 11, "name": "Estadística", "area": 1, "weight_percentage": 40.0}
        ],
        "area_config": {
            "area_type": "EVALUABLE",
            "calculation_method": "WEIGHTED",
            "approval_criteria": "AREA_AVERAGE",
            "recovery_type": "FULL_AREA"
        }
    }"#;

    fn scores() -> ScoreSheet {
        let mut grades = Vec::new();
        for (student, math, stats) in [(1u64, 4.0, 3.0), (2, 2.0, 2.5)] {
            for term in [1u64, 2] {
                for (subject, score) in [(10u64, math), (11, stats)] {
                    for process in ["COGNITIVO", "ACTITUDINAL"] {
                        grades.push(serde_json::json!({
                            "student": student, "subject": subject, "term": term,
                            "process": process, "subprocess": 1, "activity": 0,
                            "score": score
                        }));
                    }
                }
            }
        }
        serde_json::from_value(serde_json::json!({
            "students": [{"id": 1, "grade": 6}, {"id": 2, "grade": 6}],
            "grades": grades
        }))
        .expect("scores")
    }

    /// T4.1: Config parses, validates, activates, evaluates and closes.
    #[test]
    fn full_year_lifecycle() {
        let mut config: InstitutionConfig = serde_json::from_str(CONFIG).expect("config");
        assert!(validate_institution(&config).is_valid());

        lifecycle::activate(&mut config.year).expect("activate");
        assert_eq!(config.year.state, YearState::Active);

        let report = evaluate_cohort(&config, &scores());
        let first = report.student(StudentId(1)).expect("student 1");
        let math = first.subject(SubjectId(10)).expect("math");
        assert!((math.final_grade.grade - 4.0).abs() < 1e-9);
        // 4.0×0.6 + 3.0×0.4
        let area = first.areas[0].outcome().expect("decided");
        assert!((area.average.expect("average") - 3.6).abs() < 1e-9);
        assert_eq!(first.promotion.status, PromotionStatus::Promoted);

        let second = report.student(StudentId(2)).expect("student 2");
        assert_eq!(second.promotion.status, PromotionStatus::PendingRecovery);

        assert!(lifecycle::can_close(&config.year, &report).valid);
        lifecycle::close(&mut config.year, &report).expect("close");
        assert_eq!(config.year.state, YearState::Closed);
    }

    /// T4.2: Re-running the pipeline yields byte-identical exports.
    #[test]
    fn pipeline_is_idempotent() {
        let config: InstitutionConfig = serde_json::from_str(CONFIG).expect("config");
        let first = export_canonical(&evaluate_cohort(&config, &scores())).expect("export");
        let second = export_canonical(&evaluate_cohort(&config, &scores())).expect("export");
        assert_eq!(first, second);
    }

    /// T4.3: The window guard follows the explicit clock.
    #[test]
    fn window_guard_uses_explicit_now() {
        let config: InstitutionConfig = serde_json::from_str(CONFIG).expect("config");
        let term = &config.year.terms[0];
        let before: DateTime<Utc> = "2025-01-31T23:59:59Z".parse().expect("time");
        let during: DateTime<Utc> = "2025-02-01T00:00:00Z".parse().expect("time");
        let after: DateTime<Utc> = "2025-06-16T00:00:00Z".parse().expect("time");
        assert_eq!(window::status(term, before), window::WindowStatus::Upcoming);
        assert!(window::can_enter_grades(term, during));
        assert_eq!(window::status(term, after), window::WindowStatus::Closed);
    }
}
