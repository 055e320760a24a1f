//! # Configuration Resolution
//!
//! Flattens the institution configuration into the curriculum one school
//! grade actually follows: which subjects apply, how they group into areas,
//! and which [`AreaConfig`] governs each area.
//!
//! Area configuration precedence, most specific first:
//!
//! 1. grade scope, targeting the area
//! 2. grade scope, every area
//! 3. level scope, targeting the area
//! 4. level scope, every area
//! 5. global scope, targeting the area
//! 6. global scope, every area
//! 7. the institution default (`InstitutionConfig::area_config`)
//!
//! Within one rank the override listed last wins. Resolution happens once
//! per school grade, never per student.

use crate::types::{
    AreaConfig, AreaConfigOverride, AreaId, GradeId, InstitutionConfig, LevelId, SieeError,
    Subject,
};
use serde::{Deserialize, Serialize};

/// An area as one school grade sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArea {
    pub area: AreaId,
    pub name: String,
    pub is_mandatory: bool,
    pub order: u16,
    pub config: AreaConfig,
    /// Applicable subjects, by id.
    pub subjects: Vec<Subject>,
}

/// The curriculum of one school grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCurriculum {
    pub grade: GradeId,
    pub level: LevelId,
    pub min_passing_grade: f64,
    /// Areas with at least one applicable subject, by `(order, id)`.
    pub areas: Vec<ResolvedArea>,
}

impl ResolvedCurriculum {
    /// Find a resolved area by id.
    #[must_use]
    pub fn area(&self, id: AreaId) -> Option<&ResolvedArea> {
        self.areas.iter().find(|a| a.area == id)
    }

    /// Every applicable subject, grouped by area.
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.areas.iter().flat_map(|a| a.subjects.iter())
    }
}

/// Resolve the curriculum of one school grade.
///
/// # Errors
///
/// - `GradeNotFound` / `LevelNotFound` if the grade or its level is unknown
pub fn resolve(
    config: &InstitutionConfig,
    grade: GradeId,
) -> Result<ResolvedCurriculum, SieeError> {
    let level = config.level_of(grade)?;

    let mut areas: Vec<ResolvedArea> = config
        .areas
        .iter()
        .filter_map(|area| {
            let mut subjects: Vec<Subject> = config
                .subjects
                .iter()
                .filter(|s| s.area == area.id && s.scope.applies_to(level.id, grade))
                .cloned()
                .collect();
            if subjects.is_empty() {
                return None;
            }
            subjects.sort_by_key(|s| s.id);

            Some(ResolvedArea {
                area: area.id,
                name: area.name.clone(),
                is_mandatory: area.is_mandatory,
                order: area.order,
                config: area_config(config, area.id, level.id, grade),
                subjects,
            })
        })
        .collect();
    areas.sort_by_key(|a| (a.order, a.area));

    Ok(ResolvedCurriculum {
        grade,
        level: level.id,
        min_passing_grade: level.min_passing_grade,
        areas,
    })
}

/// Resolve the [`AreaConfig`] governing one area in one school grade.
#[must_use]
pub fn area_config(
    config: &InstitutionConfig,
    area: AreaId,
    level: LevelId,
    grade: GradeId,
) -> AreaConfig {
    config
        .overrides
        .iter()
        .filter(|o| o.scope.applies_to(level, grade) && o.area.is_none_or(|id| id == area))
        .max_by_key(|o| rank(o))
        .map(|o| o.config)
        .unwrap_or(config.area_config)
}

fn rank(entry: &AreaConfigOverride) -> (u8, bool) {
    (entry.scope.specificity(), entry.area.is_some())
}
