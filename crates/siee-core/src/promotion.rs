//! # Promotion Evaluator
//!
//! Consumes every area decision of one student and produces the promotion
//! outcome plus the recovery each failing area still needs.
//!
//! ## Recovery
//!
//! Only mandatory evaluable areas that are not approved require recovery.
//! The configured `RecoveryType` decides what may change the decision:
//!
//! | Recovery      | Outcome accepted                     | Effect                          |
//! |---------------|--------------------------------------|---------------------------------|
//! | `BySubject`   | [`RecoveryOutcome::SubjectGrades`]   | failing subjects re-graded      |
//! | `FullArea`    | [`RecoveryOutcome::AreaGrade`]       | score replaces the area average |
//! | `Conditional` | [`RecoveryOutcome::CouncilDecision`] | council approves or not         |
//! | `None`        | nothing                              | failure is final                |
//!
//! A conditional area without a council decision stays `PendingCouncil`.
//! That is a valid resting state, not an error.
//!
//! ## Tolerance
//!
//! [`PromotionPolicy`] sets how many mandatory areas may remain failed and
//! whether areas pending a council decision block promotion or let the
//! student pass provisionally. The default blocks on any failure.

use crate::area::{AreaAggregator, AreaOutcome, SubjectGrade};
use crate::primitives::meets;
use crate::types::{AreaId, RecoveryType, SieeError, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// POLICY
// =============================================================================

/// How areas awaiting an academic council decision affect promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionalPolicy {
    /// Pending council areas count as failed.
    #[default]
    Block,
    /// Pending council areas are tolerated; the student is promoted
    /// provisionally until the council rules.
    Provisional,
}

/// Institution promotion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PromotionPolicy {
    /// Mandatory areas that may remain failed while still promoting.
    #[serde(default)]
    pub max_failed_areas: usize,
    #[serde(default)]
    pub conditional: ConditionalPolicy,
}

// =============================================================================
// AREA DECISIONS
// =============================================================================

/// Recovery supplied for one failing area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryOutcome {
    /// New grades for the area's failing subjects.
    SubjectGrades(BTreeMap<SubjectId, f64>),
    /// One recovery score for the whole area.
    AreaGrade(f64),
    /// The academic council's ruling.
    CouncilDecision { approved: bool },
}

impl RecoveryOutcome {
    /// Check if this outcome is the kind the recovery type accepts.
    #[must_use]
    pub fn fits(&self, recovery_type: RecoveryType) -> bool {
        matches!(
            (self, recovery_type),
            (RecoveryOutcome::SubjectGrades(_), RecoveryType::BySubject)
                | (RecoveryOutcome::AreaGrade(_), RecoveryType::FullArea)
                | (RecoveryOutcome::CouncilDecision { .. }, RecoveryType::Conditional)
        )
    }
}

/// Where an area stands with respect to recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryStatus {
    /// Approved, not evaluable or not mandatory.
    NotRequired,
    /// Failed; a recovery can still be supplied.
    Required,
    /// Failed; waiting for the academic council.
    PendingCouncil,
    /// Failed, then approved by recovery.
    Recovered,
    /// Failed with no recovery left.
    Failed,
}

impl RecoveryStatus {
    /// Check if a later recovery can still change the area decision.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, RecoveryStatus::Required | RecoveryStatus::PendingCouncil)
    }
}

/// Aggregation state of one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AreaState {
    /// The area was aggregated.
    Decided(AreaOutcome),
    /// The area could not be evaluated because of a configuration error.
    Blocked { reason: String },
}

/// An area's decision as input to promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDecision {
    pub area: AreaId,
    pub is_mandatory: bool,
    pub recovery_type: RecoveryType,
    pub state: AreaState,
    pub recovery: RecoveryStatus,
    /// Outcome before recovery was applied.
    pub before_recovery: Option<AreaOutcome>,
}

impl AreaDecision {
    /// Build the decision for an aggregated area.
    #[must_use]
    pub fn decided(outcome: AreaOutcome, is_mandatory: bool, recovery_type: RecoveryType) -> Self {
        let recovery = if outcome.is_approved || !outcome.is_evaluable() || !is_mandatory {
            RecoveryStatus::NotRequired
        } else {
            match recovery_type {
                RecoveryType::BySubject | RecoveryType::FullArea => RecoveryStatus::Required,
                RecoveryType::Conditional => RecoveryStatus::PendingCouncil,
                RecoveryType::None => RecoveryStatus::Failed,
            }
        };

        Self {
            area: outcome.area,
            is_mandatory,
            recovery_type,
            state: AreaState::Decided(outcome),
            recovery,
            before_recovery: None,
        }
    }

    /// Build the decision for an area that could not be evaluated.
    #[must_use]
    pub fn blocked(
        area: AreaId,
        is_mandatory: bool,
        recovery_type: RecoveryType,
        error: &SieeError,
    ) -> Self {
        Self {
            area,
            is_mandatory,
            recovery_type,
            state: AreaState::Blocked {
                reason: error.to_string(),
            },
            recovery: RecoveryStatus::NotRequired,
            before_recovery: None,
        }
    }

    /// The aggregated outcome, if the area was evaluated.
    #[must_use]
    pub fn outcome(&self) -> Option<&AreaOutcome> {
        match &self.state {
            AreaState::Decided(outcome) => Some(outcome),
            AreaState::Blocked { .. } => None,
        }
    }

    /// Check if the area could not be evaluated.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self.state, AreaState::Blocked { .. })
    }

    /// Check if the area counts against promotion as it stands.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.is_mandatory
            && self
                .outcome()
                .is_some_and(|o| o.is_evaluable() && !o.is_approved)
    }
}

/// Apply a recovery outcome to a failing area.
///
/// `subjects` are the area's subject grades as originally aggregated; they
/// are only used for `BySubject` recovery, which re-grades the failing
/// subjects. An area that failed with no failing subject (a weighted area
/// whose weights fall short of 100) takes every supplied grade instead.
/// A recovered grade replaces the subject's qualitative verdict. Areas that
/// do not require recovery are returned unchanged.
///
/// # Errors
///
/// - `RecoveryMismatch` if the outcome kind does not fit the recovery type
/// - errors from re-aggregating the area (`BySubject`)
pub fn apply_recovery(
    decision: &AreaDecision,
    outcome: &RecoveryOutcome,
    subjects: &[SubjectGrade],
    aggregator: &AreaAggregator<'_>,
) -> Result<AreaDecision, SieeError> {
    let Some(current) = decision.outcome() else {
        return Ok(decision.clone());
    };
    if !decision.recovery.is_open() {
        return Ok(decision.clone());
    }
    if !outcome.fits(decision.recovery_type) {
        return Err(SieeError::RecoveryMismatch {
            area: decision.area,
            recovery_type: decision.recovery_type,
        });
    }

    let recovered = match outcome {
        RecoveryOutcome::SubjectGrades(grades) => {
            let failing = &current.failing_subjects;
            let regraded: Vec<SubjectGrade> = subjects
                .iter()
                .map(|s| {
                    let replaceable = failing.is_empty() || failing.contains(&s.subject);
                    match grades.get(&s.subject) {
                        Some(grade) if replaceable => SubjectGrade {
                            grade: *grade,
                            qualitative_approval: None,
                            ..s.clone()
                        },
                        _ => s.clone(),
                    }
                })
                .collect();
            aggregator.evaluate(decision.area, &regraded)?
        }
        RecoveryOutcome::AreaGrade(score) => AreaOutcome {
            average: Some(*score),
            is_approved: meets(*score, aggregator.min_passing_grade()),
            failing_subjects: Vec::new(),
            overridden_by_failing_subject: false,
            ..current.clone()
        },
        RecoveryOutcome::CouncilDecision { approved } => AreaOutcome {
            is_approved: *approved,
            ..current.clone()
        },
    };

    let recovery = if recovered.is_approved {
        RecoveryStatus::Recovered
    } else {
        RecoveryStatus::Failed
    };

    Ok(AreaDecision {
        state: AreaState::Decided(recovered),
        recovery,
        before_recovery: Some(current.clone()),
        ..decision.clone()
    })
}

// =============================================================================
// PROMOTION DECISION
// =============================================================================

/// Overall promotion status of one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionStatus {
    /// Failed mandatory areas are within tolerance.
    Promoted,
    /// Within tolerance only because council decisions are still pending.
    PromotedProvisionally,
    /// Not within tolerance, but some failing area can still recover.
    PendingRecovery,
    /// Not within tolerance and no recovery left.
    NotPromoted,
    /// A mandatory area could not be evaluated.
    Blocked,
}

impl PromotionStatus {
    /// Check if the student moves on to the next grade.
    #[must_use]
    pub fn is_promoted(&self) -> bool {
        matches!(
            self,
            PromotionStatus::Promoted | PromotionStatus::PromotedProvisionally
        )
    }
}

/// A failing area and the recovery it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaRecovery {
    pub area: AreaId,
    pub recovery_type: RecoveryType,
    pub status: RecoveryStatus,
}

/// Promotion outcome of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub status: PromotionStatus,
    pub promoted: bool,
    /// Mandatory areas still not approved.
    pub areas_requiring_recovery: Vec<AreaRecovery>,
    /// Mandatory areas that could not be evaluated.
    pub blocked_areas: Vec<AreaId>,
}

/// Evaluator bound to one promotion policy.
#[derive(Debug, Clone, Copy)]
pub struct PromotionEvaluator<'a> {
    policy: &'a PromotionPolicy,
}

impl<'a> PromotionEvaluator<'a> {
    /// Create an evaluator.
    #[must_use]
    pub fn new(policy: &'a PromotionPolicy) -> Self {
        Self { policy }
    }

    /// Decide promotion from every area decision of one student.
    #[must_use]
    pub fn evaluate(&self, areas: &[AreaDecision]) -> PromotionDecision {
        let blocked_areas: Vec<AreaId> = areas
            .iter()
            .filter(|d| d.is_mandatory && d.is_blocked())
            .map(|d| d.area)
            .collect();

        let areas_requiring_recovery: Vec<AreaRecovery> = areas
            .iter()
            .filter(|d| d.is_failing())
            .map(|d| AreaRecovery {
                area: d.area,
                recovery_type: d.recovery_type,
                status: d.recovery,
            })
            .collect();

        let status = self.status(&blocked_areas, &areas_requiring_recovery);

        PromotionDecision {
            status,
            promoted: status.is_promoted(),
            areas_requiring_recovery,
            blocked_areas,
        }
    }

    fn status(&self, blocked: &[AreaId], failing: &[AreaRecovery]) -> PromotionStatus {
        if !blocked.is_empty() {
            return PromotionStatus::Blocked;
        }

        let tolerance = self.policy.max_failed_areas;
        if failing.len() <= tolerance {
            return PromotionStatus::Promoted;
        }

        let pending_council = failing
            .iter()
            .filter(|a| a.status == RecoveryStatus::PendingCouncil)
            .count();

        match self.policy.conditional {
            ConditionalPolicy::Provisional if failing.len() - pending_council <= tolerance => {
                PromotionStatus::PromotedProvisionally
            }
            _ if failing.iter().any(|a| a.status.is_open()) => PromotionStatus::PendingRecovery,
            _ => PromotionStatus::NotPromoted,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
