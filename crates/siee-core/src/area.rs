//! # Area Aggregator
//!
//! Combines an area's subject grades into one area grade and decides the
//! area's approval.
//!
//! Two independent axes, both closed enums matched exhaustively:
//!
//! | Calculation | Area grade                                  |
//! |-------------|---------------------------------------------|
//! | `Average`   | arithmetic mean of subject grades           |
//! | `Weighted`  | `Σ(grade × weight) / 100`                   |
//! | `Dominant`  | grade of the single dominant subject        |
//!
//! | Approval          | Approved iff                                  |
//! |-------------------|-----------------------------------------------|
//! | `AreaAverage`     | area grade ≥ minimum passing grade            |
//! | `AllSubjects`     | every subject grade ≥ minimum passing grade   |
//! | `DominantSubject` | dominant subject grade ≥ minimum passing grade |
//!
//! `fail_if_any_subject_fails` is applied last and always wins.
//! Informative and formative areas produce no grade and are always approved.
//!
//! A subject graded with a qualitative code passes or fails on that code's
//! verdict instead of its numeric grade. Once any subject of an area carries
//! such a verdict, `AreaAverage` approves only when no subject fails.

use crate::aggregation::weighted_sum;
use crate::primitives::meets;
use crate::types::{
    ApprovalCriteria, AreaConfig, AreaId, AreaType, CalculationMethod, SieeError, SubjectId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// INPUT / OUTPUT
// =============================================================================

/// A subject's final grade plus the topology the area strategy needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectGrade {
    pub subject: SubjectId,
    pub grade: f64,
    pub weight_percentage: f64,
    pub is_dominant: bool,
    /// Verdict of the subject's qualitative code, if it has one.
    #[serde(default)]
    pub qualitative_approval: Option<bool>,
}

/// Result of aggregating one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOutcome {
    pub area: AreaId,
    pub area_type: AreaType,
    /// `None` for informative and formative areas.
    pub average: Option<f64>,
    pub is_approved: bool,
    /// Subjects below the minimum passing grade (evaluable areas only).
    pub failing_subjects: Vec<SubjectId>,
    /// The criterion approved the area but a failing subject overrode it.
    pub overridden_by_failing_subject: bool,
}

impl AreaOutcome {
    /// Check if the area can block promotion.
    #[must_use]
    pub fn is_evaluable(&self) -> bool {
        self.area_type.is_evaluable()
    }
}

// =============================================================================
// AGGREGATOR
// =============================================================================

/// Aggregator bound to one resolved area configuration and passing grade.
#[derive(Debug, Clone, Copy)]
pub struct AreaAggregator<'a> {
    config: &'a AreaConfig,
    min_passing_grade: f64,
}

impl<'a> AreaAggregator<'a> {
    /// Create an aggregator.
    #[must_use]
    pub fn new(config: &'a AreaConfig, min_passing_grade: f64) -> Self {
        Self {
            config,
            min_passing_grade,
        }
    }

    /// The passing grade this aggregator approves against.
    #[must_use]
    pub fn min_passing_grade(&self) -> f64 {
        self.min_passing_grade
    }

    /// Aggregate an area and decide its approval.
    ///
    /// # Errors
    ///
    /// - `EmptyArea` if an evaluable area has no subjects
    /// - `MissingDominantSubject` / `MultipleDominantSubjects` if the
    ///   strategy needs the dominant subject and the flag count is not one
    pub fn evaluate(
        &self,
        area: AreaId,
        subjects: &[SubjectGrade],
    ) -> Result<AreaOutcome, SieeError> {
        if !self.config.area_type.is_evaluable() {
            return Ok(AreaOutcome {
                area,
                area_type: self.config.area_type,
                average: None,
                is_approved: true,
                failing_subjects: Vec::new(),
                overridden_by_failing_subject: false,
            });
        }

        if subjects.is_empty() {
            return Err(SieeError::EmptyArea(area));
        }

        let average = self.average(area, subjects)?;

        let failing_subjects: Vec<SubjectId> = subjects
            .iter()
            .filter(|s| !self.passes(s))
            .map(|s| s.subject)
            .collect();
        let qualitative = subjects.iter().any(|s| s.qualitative_approval.is_some());

        let by_criterion = match self.config.approval_criteria {
            ApprovalCriteria::AreaAverage if qualitative => failing_subjects.is_empty(),
            ApprovalCriteria::AreaAverage => meets(average, self.min_passing_grade),
            ApprovalCriteria::AllSubjects => failing_subjects.is_empty(),
            ApprovalCriteria::DominantSubject => self.passes(dominant(area, subjects)?),
        };

        let overridden = by_criterion
            && self.config.fail_if_any_subject_fails
            && !failing_subjects.is_empty();

        Ok(AreaOutcome {
            area,
            area_type: self.config.area_type,
            average: Some(average),
            is_approved: by_criterion && !overridden,
            failing_subjects,
            overridden_by_failing_subject: overridden,
        })
    }

    /// Check one subject against the passing grade or its qualitative verdict.
    #[must_use]
    pub fn passes(&self, subject: &SubjectGrade) -> bool {
        subject
            .qualitative_approval
            .unwrap_or_else(|| meets(subject.grade, self.min_passing_grade))
    }

    /// Compute the area grade with the configured calculation method.
    pub fn average(&self, area: AreaId, subjects: &[SubjectGrade]) -> Result<f64, SieeError> {
        if subjects.is_empty() {
            return Err(SieeError::EmptyArea(area));
        }

        let average = match self.config.calculation_method {
            CalculationMethod::Average => {
                subjects.iter().map(|s| s.grade).sum::<f64>() / subjects.len() as f64
            }
            CalculationMethod::Weighted => {
                weighted_sum(subjects.iter().map(|s| (s.grade, s.weight_percentage)))
            }
            CalculationMethod::Dominant => dominant(area, subjects)?.grade,
        };

        Ok(average)
    }
}

/// Find the single dominant subject of an area.
pub fn dominant(area: AreaId, subjects: &[SubjectGrade]) -> Result<&SubjectGrade, SieeError> {
    let flagged: Vec<&SubjectGrade> = subjects.iter().filter(|s| s.is_dominant).collect();
    match flagged.as_slice() {
        [single] => Ok(single),
        [] => Err(SieeError::MissingDominantSubject(area)),
        many => Err(SieeError::MultipleDominantSubjects {
            area,
            subjects: many.iter().map(|s| s.subject).collect(),
        }),
    }
}

// =============================================================================
// TESTS
// =============================================================================
