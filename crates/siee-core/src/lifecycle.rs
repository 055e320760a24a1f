//! # Year Lifecycle State Machine
//!
//! ```text
//! Draft ──activate──▶ Active ──close──▶ Closed (terminal)
//! ```
//!
//! - `Draft → Active`: at least one term, term weights add up to 100
//! - `Active → Closed`: every enrolled student has all mandatory areas
//!   computed (no blocked area, no student left out of the cohort report)
//!
//! Closing does not compute promotion itself. The orchestrator evaluates the
//! cohort, passes the report to [`can_close`], and only then persists the
//! transition. Once closed, nothing leaves the state.

use crate::pipeline::CohortReport;
use crate::primitives::{WEIGHT_TOTAL, is_full_weight};
use crate::types::{AcademicYear, SieeError, YearState};
use serde::{Deserialize, Serialize};

/// Result of checking a transition: valid, or the list of reasons it is not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl TransitionCheck {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check whether a draft year can be activated.
#[must_use]
pub fn can_activate(year: &AcademicYear) -> TransitionCheck {
    let mut errors = Vec::new();

    if year.state != YearState::Draft {
        errors.push(format!("Academic year is {}, expected draft", year.state));
    }

    if year.terms.is_empty() {
        errors.push("Academic year has no terms".to_string());
    } else {
        let total = year.total_weight();
        if !is_full_weight(total) {
            errors.push(format!(
                "Term weights add up to {total}, expected {WEIGHT_TOTAL}"
            ));
        }
    }

    for term in year.terms.iter().filter(|t| t.close_at < t.open_at) {
        errors.push(format!("Term {} closes before it opens", term.id));
    }

    TransitionCheck::from_errors(errors)
}

/// Check whether an active year can be closed given its cohort report.
#[must_use]
pub fn can_close(year: &AcademicYear, cohort: &CohortReport) -> TransitionCheck {
    let mut errors = Vec::new();

    if year.state != YearState::Active {
        errors.push(format!("Academic year is {}, expected active", year.state));
    }

    if cohort.year != year.name {
        errors.push(format!(
            "Cohort report belongs to year {}, not {}",
            cohort.year, year.name
        ));
    }

    for rejected in &cohort.rejected {
        errors.push(format!(
            "Student {} could not be evaluated: {}",
            rejected.student, rejected.reason
        ));
    }

    for report in &cohort.students {
        for area in &report.promotion.blocked_areas {
            errors.push(format!(
                "Student {}: mandatory area {} could not be computed",
                report.student, area
            ));
        }
    }

    TransitionCheck::from_errors(errors)
}

/// Move a draft year to active.
///
/// # Errors
///
/// - `InvalidTransition` if the year is not in draft
/// - `TransitionRejected` if [`can_activate`] fails
pub fn activate(year: &mut AcademicYear) -> Result<(), SieeError> {
    ensure_edge(year.state, YearState::Active)?;
    let check = can_activate(year);
    if !check.valid {
        return Err(SieeError::TransitionRejected {
            to: YearState::Active,
            errors: check.errors,
        });
    }
    year.state = YearState::Active;
    Ok(())
}

/// Move an active year to closed.
///
/// # Errors
///
/// - `InvalidTransition` if the year is not active
/// - `TransitionRejected` if [`can_close`] fails
pub fn close(year: &mut AcademicYear, cohort: &CohortReport) -> Result<(), SieeError> {
    ensure_edge(year.state, YearState::Closed)?;
    let check = can_close(year, cohort);
    if !check.valid {
        return Err(SieeError::TransitionRejected {
            to: YearState::Closed,
            errors: check.errors,
        });
    }
    year.state = YearState::Closed;
    Ok(())
}

fn ensure_edge(from: YearState, to: YearState) -> Result<(), SieeError> {
    if from.next() == Some(to) {
        Ok(())
    } else {
        Err(SieeError::InvalidTransition { from, to })
    }
}
