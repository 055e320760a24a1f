//! # Scale Classifier
//!
//! Maps a numeric score (or a qualitative code) to a performance level of an
//! academic level's grading scale.
//!
//! - Linear scan over at most `MAX_PERFORMANCE_LEVELS` bands
//! - Bands are closed on both ends: `min_score <= score <= max_score`
//! - Overlapping bands: the first one in declared order wins
//! - Scores outside every band are `Unclassified`, never an error, so one
//!   student's odd grade cannot abort a cohort computation

use crate::primitives::{BAND_RESOLUTION, GRADE_TOLERANCE};
use crate::types::{AcademicLevel, PerformanceLevel, QualitativeLevel};
use serde::{Deserialize, Serialize};

// =============================================================================
// CLASSIFICATION RESULT
// =============================================================================

/// Outcome of classifying a score or code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// The score fell inside a band (or the code matched a level).
    Classified { code: String, is_approved: bool },
    /// No band or code matched.
    Unclassified,
}

impl Classification {
    /// Check if a level was found.
    #[must_use]
    pub fn is_classified(&self) -> bool {
        matches!(self, Classification::Classified { .. })
    }

    /// The matched level's approval flag, if any.
    #[must_use]
    pub fn approval(&self) -> Option<bool> {
        match self {
            Classification::Classified { is_approved, .. } => Some(*is_approved),
            Classification::Unclassified => None,
        }
    }

    /// The matched level code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Classification::Classified { code, .. } => Some(code),
            Classification::Unclassified => None,
        }
    }
}

impl From<&PerformanceLevel> for Classification {
    fn from(band: &PerformanceLevel) -> Self {
        Classification::Classified {
            code: band.code.clone(),
            is_approved: band.is_approved,
        }
    }
}

impl From<&QualitativeLevel> for Classification {
    fn from(level: &QualitativeLevel) -> Self {
        Classification::Classified {
            code: level.code.clone(),
            is_approved: level.is_approved,
        }
    }
}

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Classifier bound to one academic level's scale.
#[derive(Debug, Clone, Copy)]
pub struct ScaleClassifier<'a> {
    level: &'a AcademicLevel,
}

impl<'a> ScaleClassifier<'a> {
    /// Create a classifier for the given level.
    #[must_use]
    pub fn new(level: &'a AcademicLevel) -> Self {
        Self { level }
    }

    /// Classify a numeric score against the level's bands.
    ///
    /// Qualitative levels have no bands, so every score is `Unclassified`.
    #[must_use]
    pub fn classify(&self, score: f64) -> Classification {
        find_band(self.level.performance_levels(), score)
            .map(Classification::from)
            .unwrap_or(Classification::Unclassified)
    }

    /// Classify a qualitative code against the level's qualitative levels.
    #[must_use]
    pub fn classify_code(&self, code: &str) -> Classification {
        find_qualitative(self.level.qualitative_levels(), code)
            .map(Classification::from)
            .unwrap_or(Classification::Unclassified)
    }
}

/// Find the band containing `score`.
///
/// When bands overlap the first one in slice order wins; the `order` field
/// is display order only.
#[must_use]
pub fn find_band(bands: &[PerformanceLevel], score: f64) -> Option<&PerformanceLevel> {
    if !score.is_finite() {
        return None;
    }

    bands.iter().find(|band| contains(band, score))
}

/// Find a qualitative level by exact code.
#[must_use]
pub fn find_qualitative<'a>(
    levels: &'a [QualitativeLevel],
    code: &str,
) -> Option<&'a QualitativeLevel> {
    levels.iter().find(|level| level.code == code)
}

fn contains(band: &PerformanceLevel, score: f64) -> bool {
    score + GRADE_TOLERANCE >= band.min_score && score - GRADE_TOLERANCE <= band.max_score
}

// =============================================================================
// BAND LAYOUT INSPECTION
// =============================================================================

/// A structural problem in a level's band layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BandIssue {
    /// `min_score > max_score`.
    Inverted { code: String },
    /// Two bands share part of their range.
    Overlap { first: String, second: String },
    /// Scores between two bands belong to neither.
    Gap { below: String, above: String },
    /// The bands do not reach the bottom of the level's range.
    UncoveredMinimum { min_grade: f64, lowest: f64 },
    /// The bands do not reach the top of the level's range.
    UncoveredMaximum { max_grade: f64, highest: f64 },
    /// More bands than the classifier is meant to scan.
    TooManyBands { count: usize },
}

/// Inspect a level's numeric bands for overlaps, gaps and coverage holes.
///
/// Qualitative levels have no bands and never report issues here.
#[must_use]
pub fn inspect_bands(level: &AcademicLevel) -> Vec<BandIssue> {
    let bands = level.performance_levels();
    let mut issues = Vec::new();

    if bands.is_empty() {
        return issues;
    }

    if bands.len() > crate::primitives::MAX_PERFORMANCE_LEVELS {
        issues.push(BandIssue::TooManyBands { count: bands.len() });
    }

    for band in bands.iter().filter(|b| b.min_score > b.max_score) {
        issues.push(BandIssue::Inverted {
            code: band.code.clone(),
        });
    }

    let mut sorted: Vec<&PerformanceLevel> = bands
        .iter()
        .filter(|b| b.min_score <= b.max_score)
        .collect();
    sorted.sort_by(|a, b| a.min_score.total_cmp(&b.min_score));

    for pair in sorted.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if upper.min_score <= lower.max_score + GRADE_TOLERANCE {
            issues.push(BandIssue::Overlap {
                first: lower.code.clone(),
                second: upper.code.clone(),
            });
        } else if upper.min_score - lower.max_score > BAND_RESOLUTION + GRADE_TOLERANCE {
            issues.push(BandIssue::Gap {
                below: lower.code.clone(),
                above: upper.code.clone(),
            });
        }
    }

    if let (Some(lowest), Some(highest)) = (
        sorted.first().map(|b| b.min_score),
        sorted.iter().map(|b| b.max_score).max_by(f64::total_cmp),
    ) {
        if lowest > level.min_grade + GRADE_TOLERANCE {
            issues.push(BandIssue::UncoveredMinimum {
                min_grade: level.min_grade,
                lowest,
            });
        }
        if highest + GRADE_TOLERANCE < level.max_grade {
            issues.push(BandIssue::UncoveredMaximum {
                max_grade: level.max_grade,
                highest,
            });
        }
    }

    issues
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GradingScale, LevelId};

    fn band(code: &str, min: f64, max: f64, order: u8, approved: bool) -> PerformanceLevel {
        PerformanceLevel {
            code: code.to_string(),
            min_score: min,
            max_score: max,
            order,
            is_approved: approved,
        }
    }

    fn standard_level() -> AcademicLevel {
        AcademicLevel {
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
        }
    }

    #[test]
    fn lower_bound_of_higher_band_wins() {
        let level = standard_level();
        let classifier = ScaleClassifier::new(&level);
        assert_eq!(classifier.classify(4.0).code(), Some("ALTO"));
    }

    #[test]
    fn both_band_edges_are_inclusive() {
        let level = standard_level();
        let classifier = ScaleClassifier::new(&level);
        assert_eq!(classifier.classify(5.0).code(), Some("SUPERIOR"));
        assert_eq!(classifier.classify(1.0).code(), Some("BAJO"));
        assert_eq!(classifier.classify(2.9).code(), Some("BAJO"));
        assert_eq!(classifier.classify(3.0).code(), Some("BASICO"));
    }

    #[test]
    fn outside_every_band_is_unclassified() {
        let level = standard_level();
        let classifier = ScaleClassifier::new(&level);
        assert_eq!(classifier.classify(5.5), Classification::Unclassified);
        assert_eq!(classifier.classify(0.5), Classification::Unclassified);
        assert_eq!(classifier.classify(f64::NAN), Classification::Unclassified);
        // between BASICO (3.9) and ALTO (4.0)
        assert!(!classifier.classify(3.95).is_classified());
    }

    #[test]
    fn overlapping_bands_pick_first_declared() {
        let bands = vec![
            band("B", 3.0, 4.0, 2, true),
            band("A", 3.5, 5.0, 1, true),
        ];
        // `order` does not reorder the scan.
        assert_eq!(find_band(&bands, 3.8).map(|b| b.code.as_str()), Some("B"));
        assert_eq!(find_band(&bands, 3.2).map(|b| b.code.as_str()), Some("B"));
        assert_eq!(find_band(&bands, 4.5).map(|b| b.code.as_str()), Some("A"));
    }

    #[test]
    fn classification_carries_approval() {
        let level = standard_level();
        let classifier = ScaleClassifier::new(&level);
        assert_eq!(
            classifier.classify(2.0),
            Classification::Classified {
                code: "BAJO".to_string(),
                is_approved: false
            }
        );
    }

    #[test]
    fn qualitative_exact_code_match() {
        let level = AcademicLevel {
            id: LevelId(0),
            name: "Preescolar".to_string(),
            min_grade: 1.0,
            max_grade: 5.0,
            min_passing_grade: 3.0,
            scale: GradingScale::Qualitative {
                qualitative_levels: vec![
                    QualitativeLevel {
                        code: "ALCANZADO".to_string(),
                        description: String::new(),
                        is_approved: true,
                    },
                    QualitativeLevel {
                        code: "EN_PROCESO".to_string(),
                        description: String::new(),
                        is_approved: false,
                    },
                ],
            },
        };
        let classifier = ScaleClassifier::new(&level);
        assert_eq!(classifier.classify_code("EN_PROCESO").code(), Some("EN_PROCESO"));
        assert_eq!(classifier.classify_code("alcanzado"), Classification::Unclassified);
        assert_eq!(classifier.classify(4.0), Classification::Unclassified);
    }

    #[test]
    fn standard_layout_has_no_issues() {
        assert!(inspect_bands(&standard_level()).is_empty());
    }

    #[test]
    fn inspect_reports_overlap_and_gap() {
        let mut level = standard_level();
        level.scale = GradingScale::Numeric {
            performance_levels: vec![
                band("SUPERIOR", 4.3, 5.0, 1, true),
                band("ALTO", 4.0, 4.4, 2, true),
                band("BASICO", 3.2, 3.9, 3, true),
                band("BAJO", 1.0, 2.9, 4, false),
            ],
        };
        let issues = inspect_bands(&level);
        assert!(issues.contains(&BandIssue::Overlap {
            first: "ALTO".to_string(),
            second: "SUPERIOR".to_string()
        }));
        assert!(issues.contains(&BandIssue::Gap {
            below: "BAJO".to_string(),
            above: "BASICO".to_string()
        }));
    }

    #[test]
    fn inspect_reports_uncovered_range() {
        let mut level = standard_level();
        level.scale = GradingScale::Numeric {
            performance_levels: vec![band("BASICO", 3.0, 4.0, 1, true)],
        };
        let issues = inspect_bands(&level);
        assert!(matches!(issues[0], BandIssue::UncoveredMinimum { .. }));
        assert!(matches!(issues[1], BandIssue::UncoveredMaximum { .. }));
    }
}
