//! # Subject Finalizer
//!
//! Combines a subject's period grades, weighted by period weight, plus the
//! optional final components into the subject's final grade for the year.
//!
//! `final = Σ(period_grade × period_weight / 100)
//!        + Σ(component_score × component_weight / 100)`  (components only
//! when the grading configuration enables them)
//!
//! A term without a grade contributes `0` and is listed in `missing`.

use crate::aggregation::weighted_sum;
use crate::types::{AcademicTerm, AcademicYear, TermId, TermType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weighted share of one term in a subject's final grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermContribution {
    pub term: TermId,
    pub term_type: TermType,
    pub weight_percentage: f64,
    pub grade: Option<f64>,
}

/// A subject's final grade and the terms it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectFinal {
    pub grade: f64,
    pub contributions: Vec<TermContribution>,
    /// Terms that counted but had no grade.
    pub missing: Vec<TermId>,
}

/// Finalizer bound to one academic year's term layout.
#[derive(Debug, Clone, Copy)]
pub struct SubjectFinalizer<'a> {
    year: &'a AcademicYear,
    use_final_components: bool,
}

impl<'a> SubjectFinalizer<'a> {
    /// Create a finalizer for the given year.
    #[must_use]
    pub fn new(year: &'a AcademicYear, use_final_components: bool) -> Self {
        Self {
            year,
            use_final_components,
        }
    }

    /// Terms that count toward final grades, in term order.
    pub fn counted_terms(&self) -> impl Iterator<Item = &'a AcademicTerm> + use<'a> {
        let use_final_components = self.use_final_components;
        self.year
            .periods()
            .chain(self.year.final_components().filter(move |_| use_final_components))
    }

    /// Compute the final grade from period grades and component scores.
    ///
    /// `period_grades` is keyed by period term, `component_scores` by
    /// semester-exam term. Entries for terms that do not count are ignored.
    #[must_use]
    pub fn finalize(
        &self,
        period_grades: &BTreeMap<TermId, f64>,
        component_scores: &BTreeMap<TermId, f64>,
    ) -> SubjectFinal {
        let mut contributions = Vec::new();
        let mut missing = Vec::new();

        for term in self.counted_terms() {
            let grade = match term.term_type {
                TermType::Period => period_grades.get(&term.id).copied(),
                TermType::SemesterExam => component_scores.get(&term.id).copied(),
            };
            if grade.is_none() {
                missing.push(term.id);
            }
            contributions.push(TermContribution {
                term: term.id,
                term_type: term.term_type,
                weight_percentage: term.weight_percentage,
                grade,
            });
        }

        let grade = weighted_sum(
            contributions
                .iter()
                .map(|c| (c.grade.unwrap_or(0.0), c.weight_percentage)),
        );

        SubjectFinal {
            grade,
            contributions,
            missing,
        }
    }
}
