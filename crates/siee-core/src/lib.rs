//! # siee-core
//!
//! The deterministic grade-aggregation and promotion engine for SIEE
//! (Institutional Student Evaluation System) - THE LOGIC.
//!
//! Raw activity scores flow strictly upward through pure layers:
//!
//! ```text
//! activity → subprocess → process → period → subject → area → promotion
//! ```
//!
//! Two state machines gate when scores may be written: the grading window
//! of each term (`window`) and the academic-year lifecycle (`lifecycle`).
//!
//! ## Architectural Constraints
//!
//! - Pure: no I/O, no clock reads, no global state; `now` is always a parameter
//! - Deterministic: `BTreeMap`/`BTreeSet` only, outputs ordered by id
//! - Closed: strategies are enums matched exhaustively
//! - Tolerant: one student's bad data becomes a diagnostic, never a cohort abort
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregation;
pub mod area;
pub mod entry;
pub mod export;
pub mod lifecycle;
pub mod pipeline;
pub mod primitives;
pub mod promotion;
pub mod resolve;
pub mod scale;
pub mod subject;
pub mod types;
pub mod validation;
pub mod window;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AcademicLevel, AcademicTerm, AcademicYear, ApprovalCriteria, Area, AreaConfig,
    AreaConfigOverride, AreaId, AreaType, CalculationMethod, ConfigScope, EvaluationProcess,
    FinalComponentScore, GradeId, GradeRecord, GradingConfig, GradingScale, InstitutionConfig,
    LevelId, PerformanceLevel, ProcessCode, QualitativeLevel, RecoveryType, SchoolGrade,
    SieeError, StudentId, StudentRecord, Subject, SubjectId, Subprocess, TermId, TermType,
    YearState,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use aggregation::{ComponentAggregator, PeriodBreakdown, PeriodScores};
pub use area::{AreaAggregator, AreaOutcome, SubjectGrade};
pub use promotion::{
    AreaDecision, ConditionalPolicy, PromotionDecision, PromotionEvaluator, PromotionPolicy,
    PromotionStatus, RecoveryOutcome, RecoveryStatus, apply_recovery,
};
pub use scale::{Classification, ScaleClassifier};
pub use subject::{SubjectFinal, SubjectFinalizer};

// =============================================================================
// RE-EXPORTS: Orchestration
// =============================================================================

pub use export::{
    CanonicalHeader, canonical_checksum, export_canonical, import_canonical, verify_canonical,
};
pub use lifecycle::TransitionCheck;
pub use pipeline::{
    CohortReport, CohortSummary, Diagnostic, ScoreSheet, StudentReport, StudentScores,
    evaluate_cohort, evaluate_student,
};
pub use resolve::{ResolvedCurriculum, resolve};
pub use validation::{ConfigIssue, Severity, ValidationReport, validate_institution};
pub use window::WindowStatus;
