//! # Core Type Definitions
//!
//! This module contains all core types for the SIEE engine:
//! - Identifiers (`StudentId`, `SubjectId`, `AreaId`, `TermId`, `LevelId`, `GradeId`)
//! - Closed configuration enumerations (`AreaType`, `CalculationMethod`, ...)
//! - Configuration records (`config` submodule)
//! - Academic calendar and score records (`academic` submodule)
//! - Error types (`SieeError`)
//!
//! ## Determinism Guarantees
//!
//! All identifiers implement `Ord` so that every collection the engine emits
//! can be ordered through `BTreeMap`/`BTreeSet`. No type holds interior
//! mutability or ambient state.

mod academic;
mod config;

pub use academic::{
    AcademicTerm, AcademicYear, FinalComponentScore, GradeRecord, StudentRecord, TermType,
    YearState,
};
pub use config::{
    AcademicLevel, Area, AreaConfig, AreaConfigOverride, ConfigScope, EvaluationProcess,
    GradingConfig, GradingScale, InstitutionConfig, PerformanceLevel, QualitativeLevel,
    SchoolGrade, Subject, Subprocess,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of an enrolled student.
    StudentId
);
id_type!(
    /// Identifier of a subject (asignatura).
    SubjectId
);
id_type!(
    /// Identifier of a knowledge area grouping subjects.
    AreaId
);
id_type!(
    /// Identifier of an academic term (period or final component).
    TermId
);
id_type!(
    /// Identifier of an academic level (preschool, primary, secondary...).
    LevelId
);
id_type!(
    /// Identifier of a concrete school grade within a level.
    GradeId
);

/// Code of an evaluation process (e.g. `COGNITIVO`).
///
/// Processes are institution-configured, so the code is an open string
/// rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessCode(pub String);

impl ProcessCode {
    /// Create a new process code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProcessCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CONFIGURATION ENUMERATIONS
// =============================================================================

/// Whether an area participates in promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaType {
    /// Graded, averaged and able to block promotion.
    Evaluable,
    /// Reported only; never blocks promotion.
    Informative,
    /// Formative follow-up; never blocks promotion.
    Formative,
}

impl AreaType {
    /// Check if the area produces a numeric grade for promotion purposes.
    #[must_use]
    pub fn is_evaluable(&self) -> bool {
        matches!(self, AreaType::Evaluable)
    }
}

/// How subject grades combine into an area grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationMethod {
    /// Arithmetic mean of subject grades.
    Average,
    /// Mean weighted by each subject's `weight_percentage`.
    Weighted,
    /// The dominant subject's grade is the area grade.
    Dominant,
}

/// How an area's approval is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalCriteria {
    /// The area grade must reach the minimum passing grade.
    AreaAverage,
    /// Every subject must individually reach the minimum passing grade.
    AllSubjects,
    /// The dominant subject must reach the minimum passing grade.
    DominantSubject,
}

/// Remediation allowed when an area is not approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryType {
    /// Only the failing subjects are re-evaluated.
    BySubject,
    /// The whole area is re-evaluated.
    FullArea,
    /// An academic council decides manually.
    Conditional,
    /// No recovery; failure is final for the year.
    None,
}

impl RecoveryType {
    /// Check if a recovery attempt can still change the area decision.
    #[must_use]
    pub fn allows_recovery(&self) -> bool {
        !matches!(self, RecoveryType::None)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the SIEE engine.
///
/// - No silent failures
/// - Use `Result<T, SieeError>` for fallible operations
/// - The engine never panics; per-student data problems are reported as
///   diagnostics, not errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SieeError {
    /// An area using the dominant strategy has no dominant subject.
    #[error("Area {0} has no dominant subject")]
    MissingDominantSubject(AreaId),

    /// An area using the dominant strategy has more than one dominant subject.
    #[error("Area {area} has {} dominant subjects (expected exactly one)", subjects.len())]
    MultipleDominantSubjects {
        area: AreaId,
        subjects: Vec<SubjectId>,
    },

    /// An evaluable area has no subjects to aggregate.
    #[error("Area {0} has no subjects")]
    EmptyArea(AreaId),

    /// The referenced academic level does not exist.
    #[error("Academic level not found: {0}")]
    LevelNotFound(LevelId),

    /// The referenced school grade does not exist.
    #[error("School grade not found: {0}")]
    GradeNotFound(GradeId),

    /// The student is not part of the evaluated cohort.
    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    /// The referenced term does not exist in the academic year.
    #[error("Term not found: {0}")]
    TermNotFound(TermId),

    /// A lifecycle transition was requested from a state that does not allow it.
    #[error("Invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: YearState, to: YearState },

    /// A lifecycle transition failed its validation checks.
    #[error("Transition to {to:?} rejected: {}", errors.join("; "))]
    TransitionRejected { to: YearState, errors: Vec<String> },

    /// A recovery outcome does not match the area's configured recovery type.
    #[error("Area {area} does not accept this recovery (configured: {recovery_type:?})")]
    RecoveryMismatch {
        area: AreaId,
        recovery_type: RecoveryType,
    },

    /// Grade entry attempted while the term window is not open.
    #[error("Grading window for term {term} is {status}")]
    WindowClosed { term: TermId, status: String },

    /// Grade entry attempted while the academic year does not accept writes.
    #[error("Academic year is {0:?}; grade entry is not allowed")]
    YearNotActive(YearState),

    /// A configuration has blocking validation issues.
    #[error("Configuration has {0} blocking issue(s)")]
    InvalidConfiguration(usize),

    /// A level's grade range is inverted or not finite.
    #[error("Academic level {0} has an invalid grade range")]
    InvalidGradeRange(LevelId),

    /// An entered score is not a finite number.
    #[error("Invalid score: {0}")]
    InvalidScore(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
