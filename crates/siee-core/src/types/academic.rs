//! Academic calendar and score records.

use super::{ProcessCode, StudentId, SubjectId, TermId, GradeId};
use crate::primitives::is_graded;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// TERMS
// =============================================================================

/// Kind of academic term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermType {
    /// A regular grading period, aggregated from processes.
    Period,
    /// A final component (e.g. a semester exam) graded with one direct score.
    SemesterExam,
}

/// A grading period or final component of an academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicTerm {
    pub id: TermId,
    pub name: String,
    /// Share of the subject final grade, in percent.
    pub weight_percentage: f64,
    pub order: u8,
    #[serde(default = "default_term_type")]
    pub term_type: TermType,
    /// First instant grades may be entered.
    pub open_at: DateTime<Utc>,
    /// Last instant grades may be entered.
    pub close_at: DateTime<Utc>,
}

fn default_term_type() -> TermType {
    TermType::Period
}

// =============================================================================
// ACADEMIC YEAR
// =============================================================================

/// Lifecycle state of an academic year.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YearState {
    /// Being configured; no grading.
    #[default]
    Draft,
    /// Terms open for grading.
    Active,
    /// Promotion computed; terminal.
    Closed,
}

impl YearState {
    /// Get the next state, if any.
    #[must_use]
    pub fn next(&self) -> Option<YearState> {
        match self {
            YearState::Draft => Some(YearState::Active),
            YearState::Active => Some(YearState::Closed),
            YearState::Closed => None,
        }
    }

    /// Check if this state is terminal (Closed).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, YearState::Closed)
    }
}

impl std::fmt::Display for YearState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            YearState::Draft => "draft",
            YearState::Active => "active",
            YearState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// An academic year and its terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub name: String,
    #[serde(default)]
    pub state: YearState,
    pub terms: Vec<AcademicTerm>,
}

impl AcademicYear {
    /// Find a term by id.
    #[must_use]
    pub fn term(&self, id: TermId) -> Option<&AcademicTerm> {
        self.terms.iter().find(|t| t.id == id)
    }

    /// Regular periods, in term order.
    pub fn periods(&self) -> impl Iterator<Item = &AcademicTerm> {
        self.ordered_terms()
            .into_iter()
            .filter(|t| t.term_type == TermType::Period)
    }

    /// Final components, in term order.
    pub fn final_components(&self) -> impl Iterator<Item = &AcademicTerm> {
        self.ordered_terms()
            .into_iter()
            .filter(|t| t.term_type == TermType::SemesterExam)
    }

    /// Sum of every term weight.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.terms.iter().map(|t| t.weight_percentage).sum()
    }

    fn ordered_terms(&self) -> Vec<&AcademicTerm> {
        let mut terms: Vec<&AcademicTerm> = self.terms.iter().collect();
        terms.sort_by_key(|t| (t.order, t.id));
        terms
    }
}

// =============================================================================
// STUDENTS & SCORES
// =============================================================================

/// An enrolled student, as the score store knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    #[serde(default)]
    pub name: String,
    pub grade: GradeId,
}

/// One stored activity score.
///
/// `score` absent or `0` means "ungraded". When several records target the
/// same slot, the one with the latest `recorded_at` wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub student: StudentId,
    pub subject: SubjectId,
    pub term: TermId,
    pub process: ProcessCode,
    /// Order key of the subprocess inside the process.
    pub subprocess: u8,
    /// Zero-based activity slot inside the subprocess.
    pub activity: u16,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl GradeRecord {
    /// The score if it counts as an entered grade.
    #[must_use]
    pub fn graded_score(&self) -> Option<f64> {
        self.score.filter(|s| is_graded(*s))
    }
}

/// Direct score for a final component term (e.g. semester exam).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalComponentScore {
    pub student: StudentId,
    pub subject: SubjectId,
    pub term: TermId,
    #[serde(default)]
    pub score: Option<f64>,
}
