//! # Period Window Guard
//!
//! Decides whether grades may be entered for a term at a given instant.
//!
//! ```text
//! Upcoming ──(open_at)──▶ Open ──(close_at)──▶ Closed
//! ```
//!
//! Both bounds are inclusive. The status is never cached: every call takes
//! `now` explicitly, so a caller cannot accept a write past the closing
//! instant with a stale answer. The guard protects writes only; aggregation
//! never consults it.

use crate::types::{AcademicTerm, AcademicYear, SieeError, TermId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grading window state of one term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowStatus {
    /// `now < open_at`.
    Upcoming,
    /// `open_at <= now <= close_at`.
    Open,
    /// `now > close_at`.
    Closed,
}

impl WindowStatus {
    /// Check if grades may be entered.
    #[must_use]
    pub fn accepts_grades(&self) -> bool {
        matches!(self, WindowStatus::Open)
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowStatus::Upcoming => "upcoming",
            WindowStatus::Open => "open",
            WindowStatus::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Compute a term's window status at `now`.
#[must_use]
pub fn status(term: &AcademicTerm, now: DateTime<Utc>) -> WindowStatus {
    if now < term.open_at {
        WindowStatus::Upcoming
    } else if now > term.close_at {
        WindowStatus::Closed
    } else {
        WindowStatus::Open
    }
}

/// Check if grades may be entered for a term at `now`.
#[must_use]
pub fn can_enter_grades(term: &AcademicTerm, now: DateTime<Utc>) -> bool {
    status(term, now).accepts_grades()
}

/// Require the term's window to be open at `now`.
///
/// # Errors
///
/// - `TermNotFound` if the year has no such term
/// - `WindowClosed` if the window is upcoming or closed
pub fn require_open(
    year: &AcademicYear,
    term: TermId,
    now: DateTime<Utc>,
) -> Result<&AcademicTerm, SieeError> {
    let found = year.term(term).ok_or(SieeError::TermNotFound(term))?;
    match status(found, now) {
        WindowStatus::Open => Ok(found),
        other => Err(SieeError::WindowClosed {
            term,
            status: other.to_string(),
        }),
    }
}

/// Window status of every term in the year at `now`, in term order.
#[must_use]
pub fn year_status(year: &AcademicYear, now: DateTime<Utc>) -> Vec<(TermId, WindowStatus)> {
    let mut terms: Vec<&AcademicTerm> = year.terms.iter().collect();
    terms.sort_by_key(|t| (t.order, t.id));
    terms.into_iter().map(|t| (t.id, status(t, now))).collect()
}
