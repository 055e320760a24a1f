//! # Component Aggregator
//!
//! Computes the subprocess → process → period layers for one subject in one
//! period.
//!
//! - Subprocess average: mean of entered scores, `0` when none were entered
//! - Process average: `Σ(subprocess_avg × weight) / 100`
//! - Period grade: `Σ(process_avg × weight) / 100`
//!
//! An empty subprocess contributes `0` to its process instead of being
//! excluded. Incomplete grading therefore drags the period grade down and
//! stays visible to the teacher. The aggregator never clamps; scores are
//! clamped at entry time (see `entry`).

use crate::primitives::{WEIGHT_TOTAL, is_graded};
use crate::types::{GradeRecord, GradingConfig, ProcessCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// INPUT: SCORES OF ONE SUBJECT IN ONE PERIOD
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct StoredScore {
    score: Option<f64>,
    recorded_at: Option<DateTime<Utc>>,
}

/// Activity scores of one subject in one period, keyed by slot.
///
/// A slot is `(process, subprocess, activity)`. Recording the same slot twice
/// keeps the write with the latest `recorded_at`; on equal timestamps the
/// later write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodScores {
    slots: BTreeMap<(ProcessCode, u8), BTreeMap<u16, StoredScore>>,
}

impl PeriodScores {
    /// Create an empty score sheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a score sheet from stored records.
    ///
    /// The caller is responsible for passing records of a single
    /// (student, subject, term).
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a GradeRecord>) -> Self {
        let mut scores = Self::new();
        for record in records {
            scores.record(
                record.process.clone(),
                record.subprocess,
                record.activity,
                record.score,
                record.recorded_at,
            );
        }
        scores
    }

    /// Record one activity score.
    pub fn record(
        &mut self,
        process: ProcessCode,
        subprocess: u8,
        activity: u16,
        score: Option<f64>,
        recorded_at: Option<DateTime<Utc>>,
    ) {
        let slot = self.slots.entry((process, subprocess)).or_default();
        let stale = slot
            .get(&activity)
            .is_some_and(|existing| recorded_at < existing.recorded_at);
        if !stale {
            slot.insert(activity, StoredScore { score, recorded_at });
        }
    }

    /// Convenience for tests and callers without timestamps.
    pub fn push(&mut self, process: &str, subprocess: u8, activity: u16, score: f64) {
        self.record(ProcessCode::new(process), subprocess, activity, Some(score), None);
    }

    /// Entered scores of one subprocess, by activity slot.
    pub fn graded(
        &self,
        process: &ProcessCode,
        subprocess: u8,
    ) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.slots
            .get(&(process.clone(), subprocess))
            .into_iter()
            .flat_map(|slot| slot.iter())
            .filter_map(|(activity, stored)| {
                stored
                    .score
                    .filter(|s| is_graded(*s))
                    .map(|s| (*activity, s))
            })
    }

    /// Every `(process, subprocess)` key that has at least one record.
    pub fn keys(&self) -> impl Iterator<Item = &(ProcessCode, u8)> {
        self.slots.keys()
    }

    /// Check if no score was recorded at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// =============================================================================
// OUTPUT: PERIOD BREAKDOWN
// =============================================================================

/// Result of one subprocess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubprocessResult {
    pub order: u8,
    pub weight_percentage: f64,
    pub average: f64,
    /// Number of entered scores that were averaged.
    pub graded: usize,
    /// Number of activity slots configured.
    pub expected: u8,
    /// Entered scores beyond `expected` that were not averaged because the
    /// process does not let teachers add grades.
    pub ignored: usize,
}

impl SubprocessResult {
    /// Check if no score was entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graded == 0
    }
}

/// Result of one evaluation process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub code: ProcessCode,
    pub weight_percentage: f64,
    pub average: f64,
    pub subprocesses: Vec<SubprocessResult>,
}

/// Full breakdown of one subject's grade in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodBreakdown {
    pub grade: f64,
    pub processes: Vec<ProcessResult>,
    /// Entered scores whose process or subprocess is not configured.
    pub unmatched: usize,
}

impl PeriodBreakdown {
    /// Subprocesses without any entered score, as `(process, order)`.
    pub fn empty_subprocesses(&self) -> impl Iterator<Item = (&ProcessCode, u8)> {
        self.processes.iter().flat_map(|p| {
            p.subprocesses
                .iter()
                .filter(|sp| sp.is_empty())
                .map(move |sp| (&p.code, sp.order))
        })
    }

    /// Check if every configured subprocess has at least one score.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.empty_subprocesses().next().is_none()
    }

    /// Average of one process, if configured.
    #[must_use]
    pub fn process_average(&self, code: &str) -> Option<f64> {
        self.processes
            .iter()
            .find(|p| p.code.as_str() == code)
            .map(|p| p.average)
    }
}

// =============================================================================
// AGGREGATION FUNCTIONS
// =============================================================================

/// Mean of the entered scores; `0` when none were entered.
///
/// Ungraded values (`0`, NaN) are skipped rather than averaged as zeros.
#[must_use]
pub fn subprocess_average(scores: &[f64]) -> f64 {
    let graded: Vec<f64> = scores.iter().copied().filter(|s| is_graded(*s)).collect();
    if graded.is_empty() {
        return 0.0;
    }
    graded.iter().sum::<f64>() / graded.len() as f64
}

/// `Σ(value × weight) / 100` with weights expressed as percentages.
///
/// Weights are used as given; whether they add up to 100 is a save-time
/// validation concern.
#[must_use]
pub fn weighted_sum(parts: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    parts
        .into_iter()
        .map(|(value, weight)| value * weight)
        .sum::<f64>()
        / WEIGHT_TOTAL
}

/// Aggregator bound to one grading configuration.
#[derive(Debug, Clone, Copy)]
pub struct ComponentAggregator<'a> {
    grading: &'a GradingConfig,
}

impl<'a> ComponentAggregator<'a> {
    /// Create an aggregator for the given grading configuration.
    #[must_use]
    pub fn new(grading: &'a GradingConfig) -> Self {
        Self { grading }
    }

    /// Compute the full period breakdown for one subject.
    #[must_use]
    pub fn aggregate(&self, scores: &PeriodScores) -> PeriodBreakdown {
        let mut processes = Vec::with_capacity(self.grading.processes.len());

        for process in &self.grading.processes {
            let mut subprocesses: Vec<SubprocessResult> = process
                .subprocesses
                .iter()
                .map(|sp| {
                    let mut graded = Vec::new();
                    let mut ignored = 0;
                    for (activity, score) in scores.graded(&process.code, sp.order) {
                        if !process.allow_teacher_add_grades
                            && activity >= u16::from(sp.number_of_grades)
                        {
                            ignored += 1;
                        } else {
                            graded.push(score);
                        }
                    }
                    SubprocessResult {
                        order: sp.order,
                        weight_percentage: sp.weight_percentage,
                        average: subprocess_average(&graded),
                        graded: graded.len(),
                        expected: sp.number_of_grades,
                        ignored,
                    }
                })
                .collect();
            subprocesses.sort_by_key(|sp| sp.order);

            let average = weighted_sum(
                subprocesses
                    .iter()
                    .map(|sp| (sp.average, sp.weight_percentage)),
            );

            processes.push(ProcessResult {
                code: process.code.clone(),
                weight_percentage: process.weight_percentage,
                average,
                subprocesses,
            });
        }

        let grade = weighted_sum(processes.iter().map(|p| (p.average, p.weight_percentage)));

        let unmatched = scores
            .keys()
            .filter(|(code, order)| {
                self.grading
                    .process(code)
                    .and_then(|p| p.subprocess(*order))
                    .is_none()
            })
            .map(|(code, order)| scores.graded(code, *order).count())
            .sum();

        PeriodBreakdown {
            grade,
            processes,
            unmatched,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
