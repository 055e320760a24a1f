//! # Engine Primitives
//!
//! Hardcoded constants shared by every layer of the engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Institution-specific numbers (passing grade, weights, bands) are never
//! defined here; they arrive through configuration.

/// Total that every set of sibling weights must add up to.
///
/// Applies to subprocesses within a process, processes within a grading
/// configuration, subjects within a weighted area and terms within a year.
pub const WEIGHT_TOTAL: f64 = 100.0;

/// Tolerance used when checking that weights add up to [`WEIGHT_TOTAL`].
///
/// Weights are entered as decimals (e.g. `33.33`), so an exact comparison
/// would reject well-formed configurations.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Tolerance used when comparing a grade against a threshold or band edge.
///
/// A weighted sum such as `4.0 × 0.6 + 3.0 × 0.4` is not bit-exact in binary
/// floating point; this absorbs that noise so boundaries stay inclusive.
pub const GRADE_TOLERANCE: f64 = 1e-9;

/// Smallest grade step institutions record (one decimal place).
///
/// Bands such as `BAJO [1.0, 2.9]` and `BASICO [3.0, 3.9]` are contiguous
/// at this resolution; only a wider distance between edges is a gap.
pub const BAND_RESOLUTION: f64 = 0.1;

/// Maximum number of performance bands an academic level may define.
///
/// Classification is a linear scan; the bound keeps it trivially cheap.
pub const MAX_PERFORMANCE_LEVELS: usize = 10;

/// Magic bytes for the canonical cohort export header.
pub const MAGIC_BYTES: &[u8; 4] = b"SIEE";

/// Current canonical export format version.
///
/// Increment this when making breaking changes to the report layout.
pub const FORMAT_VERSION: u8 = 1;

/// Check whether a raw stored score counts as an entered grade.
///
/// `0` and non-finite values mean "ungraded" and are excluded from every
/// average; they are never treated as a zero grade.
#[must_use]
pub fn is_graded(score: f64) -> bool {
    score.is_finite() && score.abs() > f64::EPSILON
}

/// Check whether `value` reaches `threshold`, inclusive of the boundary.
#[must_use]
pub fn meets(value: f64, threshold: f64) -> bool {
    value + GRADE_TOLERANCE >= threshold
}

/// Check whether a weight total is exactly [`WEIGHT_TOTAL`] within tolerance.
#[must_use]
pub fn is_full_weight(total: f64) -> bool {
    (total - WEIGHT_TOTAL).abs() <= WEIGHT_TOLERANCE
}
