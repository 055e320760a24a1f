//! # Evaluation Pipeline
//!
//! Wires every layer together for one student and for a whole cohort:
//!
//! ```text
//! GradeRecord ─▶ ComponentAggregator ─▶ SubjectFinalizer ─▶ AreaAggregator
//!                                                          │
//!                         RecoveryOutcome ─▶ apply_recovery ┘─▶ PromotionEvaluator
//! ```
//!
//! ## Invariants
//!
//! - Curricula are resolved once per school grade, not per student
//! - Students, areas, subjects and terms are emitted in id/order sequence,
//!   so two runs over the same input produce identical reports
//! - Data problems become [`Diagnostic`]s on the student's report; a
//!   student whose grade cannot be resolved lands in `rejected`, as do
//!   scores for a student id missing from the roll. Neither aborts the
//!   cohort
//! - In qualitative levels a subject's code decides its approval

use crate::aggregation::{ComponentAggregator, PeriodBreakdown, PeriodScores};
use crate::area::{AreaAggregator, SubjectGrade};
use crate::primitives::is_graded;
use crate::promotion::{
    AreaDecision, PromotionDecision, PromotionEvaluator, PromotionStatus, RecoveryOutcome,
    apply_recovery,
};
use crate::resolve::{ResolvedArea, ResolvedCurriculum, resolve};
use crate::scale::{Classification, ScaleClassifier};
use crate::subject::{SubjectFinal, SubjectFinalizer};
use crate::types::{
    AcademicLevel, AreaId, FinalComponentScore, GradeId, GradeRecord, InstitutionConfig, LevelId,
    ProcessCode, SieeError, StudentId, StudentRecord, SubjectId, TermId, TermType,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// INPUT
// =============================================================================

/// A qualitative code assigned to a subject (qualitative levels only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitativeScore {
    pub student: StudentId,
    pub subject: SubjectId,
    pub code: String,
}

/// A recovery outcome supplied for one student's area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub student: StudentId,
    pub area: AreaId,
    pub outcome: RecoveryOutcome,
}

/// Everything the score store supplies for one evaluation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub grades: Vec<GradeRecord>,
    #[serde(default)]
    pub final_components: Vec<FinalComponentScore>,
    #[serde(default)]
    pub qualitative: Vec<QualitativeScore>,
    #[serde(default)]
    pub recoveries: Vec<RecoveryRecord>,
}

/// One student's scores, indexed for evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentScores {
    periods: BTreeMap<(SubjectId, TermId), PeriodScores>,
    components: BTreeMap<(SubjectId, TermId), f64>,
    qualitative: BTreeMap<SubjectId, String>,
    recoveries: BTreeMap<AreaId, RecoveryOutcome>,
}

impl StudentScores {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a score sheet into per-student indexes.
    ///
    /// Later entries for the same slot replace earlier ones unless their
    /// `recorded_at` is older.
    #[must_use]
    pub fn collect(sheet: &ScoreSheet) -> BTreeMap<StudentId, StudentScores> {
        let mut index: BTreeMap<StudentId, StudentScores> = BTreeMap::new();

        for record in &sheet.grades {
            index.entry(record.student).or_default().add_record(record);
        }
        for component in &sheet.final_components {
            let scores = index.entry(component.student).or_default();
            if let Some(score) = component.score.filter(|s| is_graded(*s)) {
                scores.set_component(component.subject, component.term, score);
            }
        }
        for q in &sheet.qualitative {
            index
                .entry(q.student)
                .or_default()
                .set_qualitative(q.subject, q.code.clone());
        }
        for r in &sheet.recoveries {
            index
                .entry(r.student)
                .or_default()
                .set_recovery(r.area, r.outcome.clone());
        }

        index
    }

    /// Add one activity score.
    pub fn add_record(&mut self, record: &GradeRecord) {
        self.periods
            .entry((record.subject, record.term))
            .or_default()
            .record(
                record.process.clone(),
                record.subprocess,
                record.activity,
                record.score,
                record.recorded_at,
            );
    }

    /// Set a final component score.
    pub fn set_component(&mut self, subject: SubjectId, term: TermId, score: f64) {
        self.components.insert((subject, term), score);
    }

    /// Set a subject's qualitative code.
    pub fn set_qualitative(&mut self, subject: SubjectId, code: String) {
        self.qualitative.insert(subject, code);
    }

    /// Set the recovery outcome of an area.
    pub fn set_recovery(&mut self, area: AreaId, outcome: RecoveryOutcome) {
        self.recoveries.insert(area, outcome);
    }

    fn subjects(&self) -> BTreeSet<SubjectId> {
        self.periods
            .keys()
            .chain(self.components.keys())
            .map(|(subject, _)| *subject)
            .chain(self.qualitative.keys().copied())
            .collect()
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// A data-quality finding attached to one student's report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A subject's final grade falls outside every performance band.
    UnclassifiedScore { subject: SubjectId, score: f64 },
    /// A qualitative code matches no qualitative level.
    UnknownQualitativeCode { subject: SubjectId, code: String },
    /// A subprocess had no entered score and contributed `0`.
    IncompleteGrading {
        subject: SubjectId,
        term: TermId,
        process: ProcessCode,
        subprocess: u8,
    },
    /// A counted period has no scores at all for the subject.
    UngradedPeriod { subject: SubjectId, term: TermId },
    /// A final component has no score and contributed `0`.
    MissingFinalComponent { subject: SubjectId, term: TermId },
    /// Scores in activity slots beyond the configured count were ignored.
    ActivityOutsideSlots {
        subject: SubjectId,
        term: TermId,
        process: ProcessCode,
        subprocess: u8,
        count: usize,
    },
    /// Scores for processes or subprocesses that are not configured.
    UnmatchedScores {
        subject: SubjectId,
        term: TermId,
        count: usize,
    },
    /// Scores for a subject that is not part of the student's curriculum.
    SubjectOutsideCurriculum { subject: SubjectId },
    /// An area could not be evaluated.
    AreaConfiguration { area: AreaId, message: String },
    /// A supplied recovery could not be applied.
    RecoveryRejected { area: AreaId, message: String },
}

/// One period of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub term: TermId,
    pub breakdown: PeriodBreakdown,
}

/// Everything computed for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectReport {
    pub subject: SubjectId,
    pub area: AreaId,
    pub periods: Vec<PeriodReport>,
    pub final_grade: SubjectFinal,
    pub performance: Classification,
}

/// Everything computed for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReport {
    pub student: StudentId,
    pub grade: GradeId,
    pub level: LevelId,
    pub subjects: Vec<SubjectReport>,
    pub areas: Vec<AreaDecision>,
    pub promotion: PromotionDecision,
    pub diagnostics: Vec<Diagnostic>,
}

impl StudentReport {
    /// Find a subject report by id.
    #[must_use]
    pub fn subject(&self, id: SubjectId) -> Option<&SubjectReport> {
        self.subjects.iter().find(|s| s.subject == id)
    }

    /// Find an area decision by id.
    #[must_use]
    pub fn area(&self, id: AreaId) -> Option<&AreaDecision> {
        self.areas.iter().find(|a| a.area == id)
    }
}

/// A student that could not be evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedStudent {
    pub student: StudentId,
    pub reason: String,
}

/// Reports for a whole cohort, ordered by student id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    pub year: String,
    pub students: Vec<StudentReport>,
    pub rejected: Vec<RejectedStudent>,
}

/// Promotion counts over a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CohortSummary {
    pub evaluated: usize,
    pub rejected: usize,
    pub promoted: usize,
    pub promoted_provisionally: usize,
    pub pending_recovery: usize,
    pub not_promoted: usize,
    pub blocked: usize,
    pub diagnostics: usize,
}

impl CohortReport {
    /// Find a student report by id.
    #[must_use]
    pub fn student(&self, id: StudentId) -> Option<&StudentReport> {
        self.students.iter().find(|s| s.student == id)
    }

    /// Count outcomes across the cohort.
    #[must_use]
    pub fn summary(&self) -> CohortSummary {
        let mut summary = CohortSummary {
            evaluated: self.students.len(),
            rejected: self.rejected.len(),
            ..CohortSummary::default()
        };
        for report in &self.students {
            summary.diagnostics += report.diagnostics.len();
            let slot = match report.promotion.status {
                PromotionStatus::Promoted => &mut summary.promoted,
                PromotionStatus::PromotedProvisionally => &mut summary.promoted_provisionally,
                PromotionStatus::PendingRecovery => &mut summary.pending_recovery,
                PromotionStatus::NotPromoted => &mut summary.not_promoted,
                PromotionStatus::Blocked => &mut summary.blocked,
            };
            *slot += 1;
        }
        summary
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Evaluate every enrolled student of a score sheet.
#[must_use]
pub fn evaluate_cohort(config: &InstitutionConfig, sheet: &ScoreSheet) -> CohortReport {
    let mut index = StudentScores::collect(sheet);
    let enrolled: BTreeMap<StudentId, &StudentRecord> =
        sheet.students.iter().map(|s| (s.id, s)).collect();

    let mut curricula: BTreeMap<GradeId, Result<ResolvedCurriculum, SieeError>> = BTreeMap::new();
    let mut students = Vec::with_capacity(enrolled.len());
    let mut rejected = Vec::new();

    for (id, student) in enrolled {
        let curriculum = curricula
            .entry(student.grade)
            .or_insert_with(|| resolve(config, student.grade));
        let scores = index.remove(&id).unwrap_or_default();

        let result = match curriculum {
            Ok(curriculum) => evaluate_student(config, curriculum, student, &scores),
            Err(e) => Err(e.clone()),
        };
        match result {
            Ok(report) => students.push(report),
            Err(e) => rejected.push(RejectedStudent {
                student: id,
                reason: e.to_string(),
            }),
        }
    }

    // whatever is left belongs to nobody on the roll
    for student in index.into_keys() {
        rejected.push(RejectedStudent {
            student,
            reason: "Scores supplied for a student who is not enrolled".to_string(),
        });
    }
    rejected.sort_by_key(|r| r.student);

    CohortReport {
        year: config.year.name.clone(),
        students,
        rejected,
    }
}

/// Evaluate one student against an already resolved curriculum.
///
/// # Errors
///
/// - `LevelNotFound` if the curriculum's level is missing from the config
pub fn evaluate_student(
    config: &InstitutionConfig,
    curriculum: &ResolvedCurriculum,
    student: &StudentRecord,
    scores: &StudentScores,
) -> Result<StudentReport, SieeError> {
    let level = config.level(curriculum.level)?;
    let mut ctx = StudentContext {
        config,
        level,
        scores,
        diagnostics: Vec::new(),
    };

    let mut subjects = Vec::new();
    let mut areas = Vec::with_capacity(curriculum.areas.len());

    for area in &curriculum.areas {
        let mut grades = Vec::with_capacity(area.subjects.len());
        for subject in &area.subjects {
            let report = ctx.subject(subject.id, area.area);
            let qualitative_approval = if level.is_qualitative() {
                report.performance.approval()
            } else {
                None
            };
            grades.push(SubjectGrade {
                subject: subject.id,
                grade: report.final_grade.grade,
                weight_percentage: subject.weight_percentage,
                is_dominant: subject.is_dominant,
                qualitative_approval,
            });
            subjects.push(report);
        }
        areas.push(ctx.area(area, curriculum.min_passing_grade, &grades));
    }

    for subject in scores.subjects() {
        if curriculum.subjects().all(|s| s.id != subject) {
            ctx.diagnostics
                .push(Diagnostic::SubjectOutsideCurriculum { subject });
        }
    }

    let promotion = PromotionEvaluator::new(&config.promotion).evaluate(&areas);

    Ok(StudentReport {
        student: student.id,
        grade: curriculum.grade,
        level: curriculum.level,
        subjects,
        areas,
        promotion,
        diagnostics: ctx.diagnostics,
    })
}

struct StudentContext<'a> {
    config: &'a InstitutionConfig,
    level: &'a AcademicLevel,
    scores: &'a StudentScores,
    diagnostics: Vec<Diagnostic>,
}

impl StudentContext<'_> {
    fn subject(&mut self, subject: SubjectId, area: AreaId) -> SubjectReport {
        let (config, scores) = (self.config, self.scores);
        let aggregator = ComponentAggregator::new(&config.grading);
        let finalizer = SubjectFinalizer::new(&config.year, config.grading.use_final_components);

        let mut periods = Vec::new();
        let mut period_grades = BTreeMap::new();
        for term in config.year.periods() {
            let Some(sheet) = scores.periods.get(&(subject, term.id)) else {
                continue;
            };
            let breakdown = aggregator.aggregate(sheet);
            self.period_diagnostics(subject, term.id, &breakdown);
            period_grades.insert(term.id, breakdown.grade);
            periods.push(PeriodReport {
                term: term.id,
                breakdown,
            });
        }

        let components: BTreeMap<TermId, f64> = scores
            .components
            .iter()
            .filter(|((s, _), _)| *s == subject)
            .map(|((_, term), score)| (*term, *score))
            .collect();

        let final_grade = finalizer.finalize(&period_grades, &components);
        for contribution in final_grade.contributions.iter().filter(|c| c.grade.is_none()) {
            self.diagnostics.push(match contribution.term_type {
                TermType::Period => Diagnostic::UngradedPeriod {
                    subject,
                    term: contribution.term,
                },
                TermType::SemesterExam => Diagnostic::MissingFinalComponent {
                    subject,
                    term: contribution.term,
                },
            });
        }

        let performance = self.classify(subject, &final_grade);

        SubjectReport {
            subject,
            area,
            periods,
            final_grade,
            performance,
        }
    }

    fn period_diagnostics(
        &mut self,
        subject: SubjectId,
        term: TermId,
        breakdown: &PeriodBreakdown,
    ) {
        for process in &breakdown.processes {
            for sp in &process.subprocesses {
                if sp.is_empty() {
                    self.diagnostics.push(Diagnostic::IncompleteGrading {
                        subject,
                        term,
                        process: process.code.clone(),
                        subprocess: sp.order,
                    });
                }
                if sp.ignored > 0 {
                    self.diagnostics.push(Diagnostic::ActivityOutsideSlots {
                        subject,
                        term,
                        process: process.code.clone(),
                        subprocess: sp.order,
                        count: sp.ignored,
                    });
                }
            }
        }
        if breakdown.unmatched > 0 {
            self.diagnostics.push(Diagnostic::UnmatchedScores {
                subject,
                term,
                count: breakdown.unmatched,
            });
        }
    }

    fn classify(&mut self, subject: SubjectId, final_grade: &SubjectFinal) -> Classification {
        let classifier = ScaleClassifier::new(self.level);

        if self.level.is_qualitative() {
            let Some(code) = self.scores.qualitative.get(&subject) else {
                return Classification::Unclassified;
            };
            let classification = classifier.classify_code(code);
            if !classification.is_classified() {
                self.diagnostics.push(Diagnostic::UnknownQualitativeCode {
                    subject,
                    code: code.clone(),
                });
            }
            return classification;
        }

        let classification = classifier.classify(final_grade.grade);
        // nothing graded yet: the missing-term diagnostics already say so
        let graded = final_grade.contributions.iter().any(|c| c.grade.is_some());
        if graded && !classification.is_classified() {
            self.diagnostics.push(Diagnostic::UnclassifiedScore {
                subject,
                score: final_grade.grade,
            });
        }
        classification
    }

    fn area(
        &mut self,
        area: &ResolvedArea,
        min_passing_grade: f64,
        grades: &[SubjectGrade],
    ) -> AreaDecision {
        let aggregator = AreaAggregator::new(&area.config, min_passing_grade);
        let recovery_type = area.config.recovery_type;

        let decision = match aggregator.evaluate(area.area, grades) {
            Ok(outcome) => AreaDecision::decided(outcome, area.is_mandatory, recovery_type),
            Err(e) => {
                self.diagnostics.push(Diagnostic::AreaConfiguration {
                    area: area.area,
                    message: e.to_string(),
                });
                return AreaDecision::blocked(area.area, area.is_mandatory, recovery_type, &e);
            }
        };

        let Some(outcome) = self.scores.recoveries.get(&area.area) else {
            return decision;
        };
        match apply_recovery(&decision, outcome, grades, &aggregator) {
            Ok(recovered) => recovered,
            Err(e) => {
                self.diagnostics.push(Diagnostic::RecoveryRejected {
                    area: area.area,
                    message: e.to_string(),
                });
                decision
            }
        }
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnclassifiedScore { subject, score } => {
                write!(f, "subject {subject}: grade {score:.2} falls in no performance band")
            }
            Diagnostic::UnknownQualitativeCode { subject, code } => {
                write!(f, "subject {subject}: unknown qualitative code {code}")
            }
            Diagnostic::IncompleteGrading {
                subject,
                term,
                process,
                subprocess,
            } => write!(
                f,
                "subject {subject}, term {term}: {process} subprocess {subprocess} has no grades"
            ),
            Diagnostic::UngradedPeriod { subject, term } => {
                write!(f, "subject {subject}: term {term} has no grades")
            }
            Diagnostic::MissingFinalComponent { subject, term } => {
                write!(f, "subject {subject}: final component {term} has no score")
            }
            Diagnostic::ActivityOutsideSlots {
                subject,
                term,
                process,
                subprocess,
                count,
            } => write!(
                f,
                "subject {subject}, term {term}: {count} score(s) beyond the slots of {process} subprocess {subprocess} ignored"
            ),
            Diagnostic::UnmatchedScores {
                subject,
                term,
                count,
            } => write!(
                f,
                "subject {subject}, term {term}: {count} score(s) for unconfigured processes"
            ),
            Diagnostic::SubjectOutsideCurriculum { subject } => {
                write!(f, "subject {subject} is not part of the student's curriculum")
            }
            Diagnostic::AreaConfiguration { area, message } => {
                write!(f, "area {area}: {message}")
            }
            Diagnostic::RecoveryRejected { area, message } => {
                write!(f, "area {area}: recovery rejected: {message}")
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotion::RecoveryStatus;
    use crate::types::{
        AcademicTerm, AcademicYear, Area, AreaConfig, CalculationMethod, ConfigScope,
        EvaluationProcess, GradingConfig, GradingScale, PerformanceLevel, QualitativeLevel,
        RecoveryType, SchoolGrade, Subject, Subprocess, YearState,
    };
    use chrono::{TimeZone, Utc};

    fn band(code: &str, min: f64, max: f64, order: u8, approved: bool) -> PerformanceLevel {
        PerformanceLevel {
            code: code.to_string(),
            min_score: min,
            max_score: max,
            order,
            is_approved: approved,
        }
    }

    fn config() -> InstitutionConfig {
        let open = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).single().expect("date");
        let close = Utc.with_ymd_and_hms(2025, 11, 30, 0, 0, 0).single().expect("date");
        InstitutionConfig {
            name: "Colegio".to_string(),
            year: AcademicYear {
                name: "2025".to_string(),
                state: YearState::Active,
                terms: vec![
                    AcademicTerm {
                        id: TermId(1),
                        name: "P1".to_string(),
                        weight_percentage: 50.0,
                        order: 1,
                        term_type: TermType::Period,
                        open_at: open,
                        close_at: close,
                    },
                    AcademicTerm {
                        id: TermId(2),
                        name: "P2".to_string(),
                        weight_percentage: 50.0,
                        order: 2,
                        term_type: TermType::Period,
                        open_at: open,
                        close_at: close,
                    },
                ],
            },
            grading: GradingConfig {
                processes: vec![EvaluationProcess {
                    code: ProcessCode::new("COGNITIVO"),
                    name: String::new(),
                    weight_percentage: 100.0,
                    subprocesses: vec![Subprocess {
                        order: 1,
                        weight_percentage: 100.0,
                        number_of_grades: 2,
                    }],
                    allow_teacher_add_grades: false,
                }],
                use_final_components: false,
            },
            levels: vec![AcademicLevel {
                id: LevelId(1),
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
            }],
            grades: vec![SchoolGrade {
                id: GradeId(6),
                name: "6°".to_string(),
                level: LevelId(1),
            }],
            areas: vec![
                Area {
                    id: AreaId(1),
                    name: "Matemáticas".to_string(),
                    is_mandatory: true,
                    order: 1,
                },
                Area {
                    id: AreaId(2),
                    name: "Ética".to_string(),
                    is_mandatory: true,
                    order: 2,
                },
            ],
            subjects: vec![
                Subject {
                    id: SubjectId(10),
                    name: "Aritmética".to_string(),
                    area: AreaId(1),
                    weekly_hours: 4,
                    weight_percentage: 0.0,
                    is_dominant: false,
                    scope: ConfigScope::Global,
                },
                Subject {
                    id: SubjectId(20),
                    name: "Ética".to_string(),
                    area: AreaId(2),
                    weekly_hours: 1,
                    weight_percentage: 0.0,
                    is_dominant: false,
                    scope: ConfigScope::Global,
                },
            ],
            area_config: AreaConfig {
                recovery_type: RecoveryType::FullArea,
                ..AreaConfig::default()
            },
            overrides: Vec::new(),
            promotion: Default::default(),
        }
    }

    fn record(student: u64, subject: u64, term: u64, activity: u16, score: f64) -> GradeRecord {
        GradeRecord {
            student: StudentId(student),
            subject: SubjectId(subject),
            term: TermId(term),
            process: ProcessCode::new("COGNITIVO"),
            subprocess: 1,
            activity,
            score: Some(score),
            recorded_at: None,
        }
    }

    fn student(id: u64) -> StudentRecord {
        StudentRecord {
            id: StudentId(id),
            name: format!("Student {id}"),
            grade: GradeId(6),
        }
    }

    fn sheet() -> ScoreSheet {
        ScoreSheet {
            students: vec![student(2), student(1)],
            grades: vec![
                record(1, 10, 1, 0, 4.0),
                record(1, 10, 2, 0, 4.0),
                record(1, 20, 1, 0, 3.0),
                record(1, 20, 2, 0, 5.0),
                record(2, 10, 1, 0, 2.0),
                record(2, 10, 1, 1, 2.0),
                record(2, 10, 2, 0, 2.5),
                record(2, 20, 1, 0, 4.0),
                record(2, 20, 2, 0, 4.0),
            ],
            ..ScoreSheet::default()
        }
    }

    #[test]
    fn cohort_is_ordered_and_promotes() {
        let report = evaluate_cohort(&config(), &sheet());

        let ids: Vec<StudentId> = report.students.iter().map(|s| s.student).collect();
        assert_eq!(ids, vec![StudentId(1), StudentId(2)]);

        let first = report.student(StudentId(1)).expect("student 1");
        assert_eq!(first.promotion.status, PromotionStatus::Promoted);
        let math = first.subject(SubjectId(10)).expect("math");
        assert!((math.final_grade.grade - 4.0).abs() < 1e-9);
        assert_eq!(math.performance.code(), Some("ALTO"));

        let second = report.student(StudentId(2)).expect("student 2");
        assert_eq!(second.promotion.status, PromotionStatus::PendingRecovery);
        assert_eq!(second.promotion.areas_requiring_recovery[0].area, AreaId(1));
    }

    #[test]
    fn full_area_recovery_flows_through() {
        let mut sheet = sheet();
        sheet.recoveries.push(RecoveryRecord {
            student: StudentId(2),
            area: AreaId(1),
            outcome: RecoveryOutcome::AreaGrade(3.2),
        });
        let report = evaluate_cohort(&config(), &sheet);
        let second = report.student(StudentId(2)).expect("student 2");
        assert_eq!(second.promotion.status, PromotionStatus::Promoted);
        assert_eq!(
            second.area(AreaId(1)).map(|a| a.recovery),
            Some(RecoveryStatus::Recovered)
        );
    }

    #[test]
    fn mismatched_recovery_becomes_a_diagnostic() {
        let mut sheet = sheet();
        sheet.recoveries.push(RecoveryRecord {
            student: StudentId(2),
            area: AreaId(1),
            outcome: RecoveryOutcome::CouncilDecision { approved: true },
        });
        let report = evaluate_cohort(&config(), &sheet);
        let second = report.student(StudentId(2)).expect("student 2");
        assert_eq!(second.promotion.status, PromotionStatus::PendingRecovery);
        assert!(second
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::RecoveryRejected { .. })));
    }

    #[test]
    fn missing_period_and_extra_activity_are_diagnosed() {
        let mut sheet = sheet();
        sheet.grades.retain(|r| !(r.student == StudentId(1) && r.term == TermId(2)));
        sheet.grades.push(record(1, 10, 1, 5, 1.0));

        let report = evaluate_cohort(&config(), &sheet);
        let first = report.student(StudentId(1)).expect("student 1");

        assert!(first.diagnostics.contains(&Diagnostic::UngradedPeriod {
            subject: SubjectId(10),
            term: TermId(2),
        }));
        assert!(first.diagnostics.contains(&Diagnostic::ActivityOutsideSlots {
            subject: SubjectId(10),
            term: TermId(1),
            process: ProcessCode::new("COGNITIVO"),
            subprocess: 1,
            count: 1,
        }));
        // 4.0 × 0.5 + 0 × 0.5
        let math = first.subject(SubjectId(10)).expect("math");
        assert!((math.final_grade.grade - 2.0).abs() < 1e-9);
    }

    #[test]
    fn dominant_misconfiguration_blocks_only_that_student_area() {
        let mut config = config();
        config.area_config.calculation_method = CalculationMethod::Dominant;
        let report = evaluate_cohort(&config, &sheet());

        assert_eq!(report.students.len(), 2);
        for student in &report.students {
            assert_eq!(student.promotion.status, PromotionStatus::Blocked);
            assert!(student
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::AreaConfiguration { .. })));
        }
    }

    #[test]
    fn unknown_grade_is_rejected_not_fatal() {
        let mut sheet = sheet();
        sheet.students.push(StudentRecord {
            id: StudentId(3),
            name: String::new(),
            grade: GradeId(99),
        });
        let report = evaluate_cohort(&config(), &sheet);
        assert_eq!(report.students.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].student, StudentId(3));
        assert_eq!(report.summary().rejected, 1);
    }

    #[test]
    fn scores_for_unenrolled_students_are_rejected() {
        let mut sheet = sheet();
        sheet.grades.push(record(12, 10, 1, 0, 4.5));
        let report = evaluate_cohort(&config(), &sheet);

        assert_eq!(report.students.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].student, StudentId(12));
        assert!(report.rejected[0].reason.contains("not enrolled"));
    }

    #[test]
    fn qualitative_codes_decide_approval() {
        let mut config = config();
        let code = |code: &str, approved: bool| QualitativeLevel {
            code: code.to_string(),
            description: String::new(),
            is_approved: approved,
        };
        config.levels[0].scale = GradingScale::Qualitative {
            qualitative_levels: vec![code("LOGRADO", true), code("EN_PROCESO", false)],
        };
        let assign = |student: u64, subject: u64, code: &str| QualitativeScore {
            student: StudentId(student),
            subject: SubjectId(subject),
            code: code.to_string(),
        };
        let sheet = ScoreSheet {
            students: vec![student(1), student(2)],
            qualitative: vec![
                assign(1, 10, "LOGRADO"),
                assign(1, 20, "LOGRADO"),
                assign(2, 10, "LOGRADO"),
                assign(2, 20, "EN_PROCESO"),
            ],
            ..ScoreSheet::default()
        };

        let report = evaluate_cohort(&config, &sheet);

        let first = report.student(StudentId(1)).expect("student 1");
        assert_eq!(first.promotion.status, PromotionStatus::Promoted);

        let second = report.student(StudentId(2)).expect("student 2");
        assert_eq!(second.promotion.status, PromotionStatus::PendingRecovery);
        assert_eq!(second.promotion.areas_requiring_recovery[0].area, AreaId(2));
    }

    #[test]
    fn scores_for_foreign_subjects_are_flagged() {
        let mut sheet = sheet();
        sheet.grades.push(record(1, 99, 1, 0, 4.0));
        let report = evaluate_cohort(&config(), &sheet);
        let first = report.student(StudentId(1)).expect("student 1");
        assert!(first
            .diagnostics
            .contains(&Diagnostic::SubjectOutsideCurriculum {
                subject: SubjectId(99)
            }));
    }

    #[test]
    fn summary_counts_statuses() {
        let summary = evaluate_cohort(&config(), &sheet()).summary();
        assert_eq!(summary.evaluated, 2);
        assert_eq!(summary.promoted, 1);
        assert_eq!(summary.pending_recovery, 1);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let config = config();
        let sheet = sheet();
        assert_eq!(evaluate_cohort(&config, &sheet), evaluate_cohort(&config, &sheet));
    }
}
