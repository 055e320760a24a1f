//! # Score Entry Gate
//!
//! Boundary checks applied before a score reaches the score store. The
//! aggregation layers never clamp; scores are normalised here instead.
//!
//! A score is admitted only when the academic year is active and the term's
//! grading window is open at `now`. Admitted values are then normalised:
//! absent or `0` stays ungraded, and anything else is clamped into the
//! level's `[min_grade, max_grade]`.

use crate::primitives::is_graded;
use crate::types::{AcademicLevel, AcademicYear, SieeError, TermId, YearState};
use crate::window;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A score accepted for storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdmittedScore {
    /// `None` means ungraded.
    pub score: Option<f64>,
    /// The entered value lay outside the level's range and was clamped.
    pub clamped: bool,
}

/// Normalise an entered score against a level's grade range.
///
/// # Errors
///
/// - `InvalidScore` if the value is NaN or infinite
/// - `InvalidGradeRange` if the level's bounds are inverted or not finite
pub fn normalize(level: &AcademicLevel, raw: Option<f64>) -> Result<AdmittedScore, SieeError> {
    let (min, max) = (level.min_grade, level.max_grade);
    if !(min.is_finite() && max.is_finite() && min <= max) {
        return Err(SieeError::InvalidGradeRange(level.id));
    }

    let Some(value) = raw else {
        return Ok(AdmittedScore {
            score: None,
            clamped: false,
        });
    };

    if !value.is_finite() {
        return Err(SieeError::InvalidScore(value.to_string()));
    }

    if !is_graded(value) {
        return Ok(AdmittedScore {
            score: None,
            clamped: false,
        });
    }

    Ok(AdmittedScore {
        score: Some(value.clamp(min, max)),
        clamped: value < min || value > max,
    })
}

/// Admit a score for one term at `now`.
///
/// # Errors
///
/// - `YearNotActive` if the year is draft or closed
/// - `TermNotFound` / `WindowClosed` from the window guard
/// - `InvalidScore` / `InvalidGradeRange` from [`normalize`]
pub fn admit(
    year: &AcademicYear,
    term: TermId,
    level: &AcademicLevel,
    raw: Option<f64>,
    now: DateTime<Utc>,
) -> Result<AdmittedScore, SieeError> {
    if year.state != YearState::Active {
        return Err(SieeError::YearNotActive(year.state));
    }
    window::require_open(year, term, now)?;
    normalize(level, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AcademicTerm, GradingScale, LevelId, TermType};
    use chrono::TimeZone;

    fn level() -> AcademicLevel {
        AcademicLevel {
            id: LevelId(1),
            name: "Secundaria".to_string(),
            min_grade: 1.0,
            max_grade: 5.0,
            min_passing_grade: 3.0,
            scale: GradingScale::Numeric {
                performance_levels: Vec::new(),
            },
        }
    }

    fn at(month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, 10, 8, 0, 0)
            .single()
            .expect("date")
    }

    fn year(state: YearState) -> AcademicYear {
        AcademicYear {
            name: "2025".to_string(),
            state,
            terms: vec![AcademicTerm {
                id: TermId(1),
                name: "P1".to_string(),
                weight_percentage: 100.0,
                order: 1,
                term_type: TermType::Period,
                open_at: at(2),
                close_at: at(4),
            }],
        }
    }

    #[test]
    fn zero_and_absent_stay_ungraded() {
        let level = level();
        assert_eq!(normalize(&level, None).expect("ok").score, None);
        assert_eq!(normalize(&level, Some(0.0)).expect("ok").score, None);
    }

    #[test]
    fn out_of_range_is_clamped() {
        let level = level();
        let high = normalize(&level, Some(7.5)).expect("ok");
        assert_eq!(high.score, Some(5.0));
        assert!(high.clamped);

        let low = normalize(&level, Some(0.5)).expect("ok");
        assert_eq!(low.score, Some(1.0));
        assert!(low.clamped);

        let fine = normalize(&level, Some(3.7)).expect("ok");
        assert_eq!(fine.score, Some(3.7));
        assert!(!fine.clamped);
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(matches!(
            normalize(&level(), Some(f64::NAN)),
            Err(SieeError::InvalidScore(_))
        ));
    }

    #[test]
    fn broken_level_range_is_an_error() {
        let mut inverted = level();
        inverted.min_grade = 5.0;
        inverted.max_grade = 1.0;
        assert_eq!(
            normalize(&inverted, Some(3.0)),
            Err(SieeError::InvalidGradeRange(LevelId(1)))
        );
        // Rejected even when nothing would be clamped.
        assert_eq!(
            normalize(&inverted, None),
            Err(SieeError::InvalidGradeRange(LevelId(1)))
        );

        let mut unbounded = level();
        unbounded.max_grade = f64::NAN;
        assert_eq!(
            normalize(&unbounded, Some(3.0)),
            Err(SieeError::InvalidGradeRange(LevelId(1)))
        );
    }

    #[test]
    fn admission_requires_active_year_and_open_window() {
        let level = level();

        assert_eq!(
            admit(&year(YearState::Draft), TermId(1), &level, Some(4.0), at(3)),
            Err(SieeError::YearNotActive(YearState::Draft))
        );
        assert_eq!(
            admit(&year(YearState::Closed), TermId(1), &level, Some(4.0), at(3)),
            Err(SieeError::YearNotActive(YearState::Closed))
        );
        assert!(matches!(
            admit(&year(YearState::Active), TermId(1), &level, Some(4.0), at(5)),
            Err(SieeError::WindowClosed { .. })
        ));

        let admitted = admit(&year(YearState::Active), TermId(1), &level, Some(4.0), at(3))
            .expect("admit");
        assert_eq!(admitted.score, Some(4.0));
    }
}
