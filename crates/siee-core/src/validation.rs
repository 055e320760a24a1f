//! # Configuration Validation
//!
//! Save-time checks over an [`InstitutionConfig`]. The engine trusts its
//! inputs at compute time; this is where misconfiguration is surfaced.
//!
//! | Check                                   | Severity   |
//! |-----------------------------------------|------------|
//! | process / subprocess / term weight sums | `Blocking` |
//! | subject weight sums (weighted areas)    | `Blocking` |
//! | dominant subject cardinality            | `Blocking` |
//! | dangling level / area references        | `Blocking` |
//! | grade range, duplicate codes, inverted bands | `Blocking` |
//! | band overlaps, gaps, coverage           | `Warning`  |
//! | empty numeric scale, zero activity slots | `Warning` |
//!
//! Checks that depend on subject scope run once per school grade, against
//! the resolved curriculum.

use crate::primitives::{WEIGHT_TOTAL, is_full_weight};
use crate::resolve::{ResolvedArea, resolve};
use crate::scale::{BandIssue, inspect_bands};
use crate::types::{
    AcademicLevel, ApprovalCriteria, AreaId, CalculationMethod, GradeId, InstitutionConfig,
    LevelId, ProcessCode, SubjectId, TermId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// REPORT TYPES
// =============================================================================

/// How serious a configuration issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// The configuration must not be saved.
    Blocking,
    /// Saved, but results may surprise.
    Warning,
}

/// The set of sibling weights a weight check covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightScope {
    Processes,
    Subprocesses { process: ProcessCode },
    Terms,
    AreaSubjects { area: AreaId, grade: GradeId },
}

/// What is wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    WeightSumMismatch {
        scope: WeightScope,
        total: f64,
    },
    MissingDominantSubject {
        area: AreaId,
        grade: GradeId,
    },
    MultipleDominantSubjects {
        area: AreaId,
        grade: GradeId,
        subjects: Vec<SubjectId>,
    },
    BandLayout {
        level: LevelId,
        issue: BandIssue,
    },
    EmptyScale {
        level: LevelId,
    },
    InvalidGradeRange {
        level: LevelId,
    },
    DuplicateQualitativeCode {
        level: LevelId,
        code: String,
    },
    DuplicateSubprocessOrder {
        process: ProcessCode,
        order: u8,
    },
    NoActivitySlots {
        process: ProcessCode,
        order: u8,
    },
    UnknownLevel {
        grade: GradeId,
        level: LevelId,
    },
    UnknownArea {
        subject: SubjectId,
        area: AreaId,
    },
    InvertedWindow {
        term: TermId,
    },
}

/// One configuration problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub kind: IssueKind,
}

/// Every issue found in one configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ConfigIssue>,
}

impl ValidationReport {
    /// Check if the configuration may be saved.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Blocking)
    }

    /// Issues that prevent saving.
    pub fn blocking(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Blocking)
    }

    /// Issues that do not prevent saving.
    pub fn warnings(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    fn block(&mut self, kind: IssueKind) {
        self.issues.push(ConfigIssue {
            severity: Severity::Blocking,
            kind,
        });
    }

    fn warn(&mut self, kind: IssueKind) {
        self.issues.push(ConfigIssue {
            severity: Severity::Warning,
            kind,
        });
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validate an institution configuration.
#[must_use]
pub fn validate_institution(config: &InstitutionConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_processes(config, &mut report);
    check_terms(config, &mut report);
    for level in &config.levels {
        check_level(level, &mut report);
    }
    check_references(config, &mut report);

    for grade in &config.grades {
        // dangling grade → level references are reported by check_references
        let Ok(curriculum) = resolve(config, grade.id) else {
            continue;
        };
        for area in &curriculum.areas {
            check_area(area, grade.id, &mut report);
        }
    }

    report
}

fn check_processes(config: &InstitutionConfig, report: &mut ValidationReport) {
    let processes = &config.grading.processes;
    let total: f64 = processes.iter().map(|p| p.weight_percentage).sum();
    if !is_full_weight(total) {
        report.block(IssueKind::WeightSumMismatch {
            scope: WeightScope::Processes,
            total,
        });
    }

    for process in processes {
        let total: f64 = process
            .subprocesses
            .iter()
            .map(|sp| sp.weight_percentage)
            .sum();
        if !is_full_weight(total) {
            report.block(IssueKind::WeightSumMismatch {
                scope: WeightScope::Subprocesses {
                    process: process.code.clone(),
                },
                total,
            });
        }

        let mut seen = BTreeSet::new();
        for sp in &process.subprocesses {
            if !seen.insert(sp.order) {
                report.block(IssueKind::DuplicateSubprocessOrder {
                    process: process.code.clone(),
                    order: sp.order,
                });
            }
            if sp.number_of_grades == 0 && !process.allow_teacher_add_grades {
                report.warn(IssueKind::NoActivitySlots {
                    process: process.code.clone(),
                    order: sp.order,
                });
            }
        }
    }
}

fn check_terms(config: &InstitutionConfig, report: &mut ValidationReport) {
    let year = &config.year;
    let total = year.total_weight();
    if !is_full_weight(total) {
        report.block(IssueKind::WeightSumMismatch {
            scope: WeightScope::Terms,
            total,
        });
    }

    for term in year.terms.iter().filter(|t| t.close_at < t.open_at) {
        report.block(IssueKind::InvertedWindow { term: term.id });
    }
}

fn check_level(level: &AcademicLevel, report: &mut ValidationReport) {
    let range_ok = level.min_grade < level.max_grade
        && level.min_passing_grade >= level.min_grade
        && level.min_passing_grade <= level.max_grade;
    if !range_ok {
        report.block(IssueKind::InvalidGradeRange { level: level.id });
    }

    if level.is_qualitative() {
        let mut seen = BTreeSet::new();
        for q in level.qualitative_levels() {
            if !seen.insert(q.code.as_str()) {
                report.block(IssueKind::DuplicateQualitativeCode {
                    level: level.id,
                    code: q.code.clone(),
                });
            }
        }
        return;
    }

    if level.performance_levels().is_empty() {
        report.warn(IssueKind::EmptyScale { level: level.id });
    }

    for issue in inspect_bands(level) {
        let inverted = matches!(issue, BandIssue::Inverted { .. });
        let kind = IssueKind::BandLayout {
            level: level.id,
            issue,
        };
        if inverted {
            report.block(kind);
        } else {
            report.warn(kind);
        }
    }
}

fn check_references(config: &InstitutionConfig, report: &mut ValidationReport) {
    for grade in &config.grades {
        if config.level(grade.level).is_err() {
            report.block(IssueKind::UnknownLevel {
                grade: grade.id,
                level: grade.level,
            });
        }
    }

    let areas: BTreeSet<AreaId> = config.areas.iter().map(|a| a.id).collect();
    for subject in config.subjects.iter().filter(|s| !areas.contains(&s.area)) {
        report.block(IssueKind::UnknownArea {
            subject: subject.id,
            area: subject.area,
        });
    }
}

fn check_area(area: &ResolvedArea, grade: GradeId, report: &mut ValidationReport) {
    if !area.config.area_type.is_evaluable() {
        return;
    }

    if area.config.calculation_method == CalculationMethod::Weighted {
        let total: f64 = area.subjects.iter().map(|s| s.weight_percentage).sum();
        if !is_full_weight(total) {
            report.block(IssueKind::WeightSumMismatch {
                scope: WeightScope::AreaSubjects {
                    area: area.area,
                    grade,
                },
                total,
            });
        }
    }

    let needs_dominant = area.config.calculation_method == CalculationMethod::Dominant
        || area.config.approval_criteria == ApprovalCriteria::DominantSubject;
    if needs_dominant {
        let dominant: Vec<SubjectId> = area
            .subjects
            .iter()
            .filter(|s| s.is_dominant)
            .map(|s| s.id)
            .collect();
        match dominant.len() {
            1 => {}
            0 => report.block(IssueKind::MissingDominantSubject {
                area: area.area,
                grade,
            }),
            _ => report.block(IssueKind::MultipleDominantSubjects {
                area: area.area,
                grade,
                subjects: dominant,
            }),
        }
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

impl fmt::Display for WeightScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightScope::Processes => write!(f, "evaluation processes"),
            WeightScope::Subprocesses { process } => write!(f, "subprocesses of {process}"),
            WeightScope::Terms => write!(f, "academic terms"),
            WeightScope::AreaSubjects { area, grade } => {
                write!(f, "subjects of area {area} in grade {grade}")
            }
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::WeightSumMismatch { scope, total } => {
                write!(f, "Weights of {scope} add up to {total}, expected {WEIGHT_TOTAL}")
            }
            IssueKind::MissingDominantSubject { area, grade } => {
                write!(f, "Area {area} has no dominant subject in grade {grade}")
            }
            IssueKind::MultipleDominantSubjects {
                area,
                grade,
                subjects,
            } => write!(
                f,
                "Area {area} has {} dominant subjects in grade {grade}",
                subjects.len()
            ),
            IssueKind::BandLayout { level, issue } => match issue {
                BandIssue::Inverted { code } => {
                    write!(f, "Level {level}: band {code} has min above max")
                }
                BandIssue::Overlap { first, second } => {
                    write!(f, "Level {level}: bands {first} and {second} overlap")
                }
                BandIssue::Gap { below, above } => {
                    write!(f, "Level {level}: gap between bands {below} and {above}")
                }
                BandIssue::UncoveredMinimum { min_grade, lowest } => write!(
                    f,
                    "Level {level}: scores from {min_grade} to {lowest} fall in no band"
                ),
                BandIssue::UncoveredMaximum { max_grade, highest } => write!(
                    f,
                    "Level {level}: scores from {highest} to {max_grade} fall in no band"
                ),
                BandIssue::TooManyBands { count } => {
                    write!(f, "Level {level}: {count} performance bands defined")
                }
            },
            IssueKind::EmptyScale { level } => {
                write!(f, "Level {level} has no performance bands")
            }
            IssueKind::InvalidGradeRange { level } => write!(
                f,
                "Level {level}: passing grade must lie within min and max grade"
            ),
            IssueKind::DuplicateQualitativeCode { level, code } => {
                write!(f, "Level {level}: qualitative code {code} defined twice")
            }
            IssueKind::DuplicateSubprocessOrder { process, order } => {
                write!(f, "Process {process}: subprocess order {order} used twice")
            }
            IssueKind::NoActivitySlots { process, order } => {
                write!(f, "Process {process}: subprocess {order} has no activity slots")
            }
            IssueKind::UnknownLevel { grade, level } => {
                write!(f, "Grade {grade} refers to unknown level {level}")
            }
            IssueKind::UnknownArea { subject, area } => {
                write!(f, "Subject {subject} refers to unknown area {area}")
            }
            IssueKind::InvertedWindow { term } => {
                write!(f, "Term {term} closes before it opens")
            }
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Blocking => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{tag}: {}", self.kind)
    }
}

// =============================================================================
// TESTS
// =============================================================================
