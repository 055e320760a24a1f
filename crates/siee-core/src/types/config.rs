//! Institution configuration records.
//!
//! Everything in this file is supplied read-only by the configuration
//! provider and versioned per academic year. The engine never mutates it.

use super::{
    AcademicYear, AreaId, AreaType, ApprovalCriteria, CalculationMethod, GradeId, LevelId,
    ProcessCode, RecoveryType, SieeError, SubjectId,
};
use crate::promotion::PromotionPolicy;
use serde::{Deserialize, Serialize};

// =============================================================================
// EVALUATION PROCESSES
// =============================================================================

/// A sub-grouping of graded activities inside an evaluation process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subprocess {
    /// Position inside the process; also the key grade records refer to.
    pub order: u8,
    /// Share of the process average, in percent.
    pub weight_percentage: f64,
    /// Number of activity slots teachers grade.
    pub number_of_grades: u8,
}

/// An evaluative dimension such as cognitive, procedural or attitudinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationProcess {
    pub code: ProcessCode,
    #[serde(default)]
    pub name: String,
    /// Share of the period grade, in percent.
    pub weight_percentage: f64,
    pub subprocesses: Vec<Subprocess>,
    /// Teachers may grade activities beyond `number_of_grades`.
    #[serde(default)]
    pub allow_teacher_add_grades: bool,
}

impl EvaluationProcess {
    /// Find a subprocess by its order key.
    #[must_use]
    pub fn subprocess(&self, order: u8) -> Option<&Subprocess> {
        self.subprocesses.iter().find(|sp| sp.order == order)
    }
}

/// The grading configuration of one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingConfig {
    pub processes: Vec<EvaluationProcess>,
    /// Whether semester-exam terms contribute to subject final grades.
    #[serde(default)]
    pub use_final_components: bool,
}

impl GradingConfig {
    /// Find a process by code.
    #[must_use]
    pub fn process(&self, code: &ProcessCode) -> Option<&EvaluationProcess> {
        self.processes.iter().find(|p| &p.code == code)
    }
}

// =============================================================================
// GRADING SCALES
// =============================================================================

/// A named numeric band, closed on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLevel {
    pub code: String,
    pub min_score: f64,
    pub max_score: f64,
    pub order: u8,
    pub is_approved: bool,
}

/// A named qualitative assessment used instead of numeric bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitativeLevel {
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub is_approved: bool,
}

/// The scale an academic level reports grades on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradingScale {
    Numeric {
        performance_levels: Vec<PerformanceLevel>,
    },
    Qualitative {
        qualitative_levels: Vec<QualitativeLevel>,
    },
}

/// An academic level (preschool, primary, secondary...) and its scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicLevel {
    pub id: LevelId,
    pub name: String,
    pub min_grade: f64,
    pub max_grade: f64,
    pub min_passing_grade: f64,
    pub scale: GradingScale,
}

impl AcademicLevel {
    /// Numeric bands of this level; empty for qualitative scales.
    #[must_use]
    pub fn performance_levels(&self) -> &[PerformanceLevel] {
        match &self.scale {
            GradingScale::Numeric { performance_levels } => performance_levels,
            GradingScale::Qualitative { .. } => &[],
        }
    }

    /// Qualitative codes of this level; empty for numeric scales.
    #[must_use]
    pub fn qualitative_levels(&self) -> &[QualitativeLevel] {
        match &self.scale {
            GradingScale::Numeric { .. } => &[],
            GradingScale::Qualitative { qualitative_levels } => qualitative_levels,
        }
    }

    /// Check if this level grades qualitatively.
    #[must_use]
    pub fn is_qualitative(&self) -> bool {
        matches!(self.scale, GradingScale::Qualitative { .. })
    }
}

/// A concrete school grade (e.g. "6°") inside an academic level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolGrade {
    pub id: GradeId,
    pub name: String,
    pub level: LevelId,
}

// =============================================================================
// AREAS & SUBJECTS
// =============================================================================

/// Strategy bundle that decides how an area is graded and recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaConfig {
    pub area_type: AreaType,
    pub calculation_method: CalculationMethod,
    pub approval_criteria: ApprovalCriteria,
    pub recovery_type: RecoveryType,
    /// Any failing subject fails the area, whatever the criterion says.
    #[serde(default)]
    pub fail_if_any_subject_fails: bool,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            area_type: AreaType::Evaluable,
            calculation_method: CalculationMethod::Average,
            approval_criteria: ApprovalCriteria::AreaAverage,
            recovery_type: RecoveryType::BySubject,
            fail_if_any_subject_fails: false,
        }
    }
}

/// Where a subject or configuration override applies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigScope {
    /// Every level and grade.
    #[default]
    Global,
    /// Every grade of one academic level.
    Level(LevelId),
    /// One school grade only.
    Grade(GradeId),
}

impl ConfigScope {
    /// Check if the scope covers a school grade of the given level.
    #[must_use]
    pub fn applies_to(&self, level: LevelId, grade: GradeId) -> bool {
        match self {
            ConfigScope::Global => true,
            ConfigScope::Level(id) => *id == level,
            ConfigScope::Grade(id) => *id == grade,
        }
    }

    /// Higher is more specific: grade > level > global.
    #[must_use]
    pub fn specificity(&self) -> u8 {
        match self {
            ConfigScope::Global => 0,
            ConfigScope::Level(_) => 1,
            ConfigScope::Grade(_) => 2,
        }
    }
}

/// An [`AreaConfig`] that replaces the institution default within a scope.
///
/// When `area` is set the override only targets that area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaConfigOverride {
    #[serde(default)]
    pub scope: ConfigScope,
    #[serde(default)]
    pub area: Option<AreaId>,
    pub config: AreaConfig,
}

fn default_mandatory() -> bool {
    true
}

/// A knowledge area grouping subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    #[serde(default = "default_mandatory")]
    pub is_mandatory: bool,
    #[serde(default)]
    pub order: u16,
}

/// A subject taught within exactly one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub area: AreaId,
    #[serde(default)]
    pub weekly_hours: u8,
    /// Share of the area grade under the weighted strategy, in percent.
    #[serde(default)]
    pub weight_percentage: f64,
    #[serde(default)]
    pub is_dominant: bool,
    #[serde(default)]
    pub scope: ConfigScope,
}

// =============================================================================
// INSTITUTION SNAPSHOT
// =============================================================================

/// Everything the configuration provider supplies for one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionConfig {
    pub name: String,
    pub year: AcademicYear,
    pub grading: GradingConfig,
    pub levels: Vec<AcademicLevel>,
    pub grades: Vec<SchoolGrade>,
    pub areas: Vec<Area>,
    pub subjects: Vec<Subject>,
    /// Institution-wide default strategy.
    #[serde(default)]
    pub area_config: AreaConfig,
    #[serde(default)]
    pub overrides: Vec<AreaConfigOverride>,
    #[serde(default)]
    pub promotion: PromotionPolicy,
}

impl InstitutionConfig {
    /// Find an academic level by id.
    pub fn level(&self, id: LevelId) -> Result<&AcademicLevel, SieeError> {
        self.levels
            .iter()
            .find(|l| l.id == id)
            .ok_or(SieeError::LevelNotFound(id))
    }

    /// Find a school grade by id.
    pub fn grade(&self, id: GradeId) -> Result<&SchoolGrade, SieeError> {
        self.grades
            .iter()
            .find(|g| g.id == id)
            .ok_or(SieeError::GradeNotFound(id))
    }

    /// Find the academic level a school grade belongs to.
    pub fn level_of(&self, grade: GradeId) -> Result<&AcademicLevel, SieeError> {
        let grade = self.grade(grade)?;
        self.level(grade.level)
    }
}
