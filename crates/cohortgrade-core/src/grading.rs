//! Score normalization and pass determination.
//!
//! A raw score is placed on its exam's scale as a fraction, then projected
//! onto the cohort's scale. The result is always clamped to the cohort
//! scale, so grader errors and bonus points never leak past its bounds.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::model::{Cohort, Exam, Scale};

// ---------------------------------------------------------------------------
// Score normalizer
// ---------------------------------------------------------------------------

/// Rescale `raw` from `[exam_min, exam_max]` onto `[cohort_min, cohort_max]`.
///
/// Fails with [`EvalError::Configuration`] if either scale is degenerate and
/// with [`EvalError::InvalidScore`] if `raw` is `NaN`. Infinite scores are
/// clamped like any other out-of-range score.
pub fn normalize(
    raw: f64,
    exam_min: f64,
    exam_max: f64,
    cohort_min: f64,
    cohort_max: f64,
) -> Result<f64, EvalError> {
    let exam = Scale::new(exam_min, exam_max).checked("exam", "unnamed")?;
    let cohort = Scale::new(cohort_min, cohort_max).checked("cohort", "unnamed")?;
    rescale(raw, exam, cohort)
}

/// Normalize a raw score for `exam` onto the scale of `cohort`.
pub fn normalize_grade(raw: f64, exam: &Exam, cohort: &Cohort) -> Result<f64, EvalError> {
    rescale(raw, exam.checked_scale()?, cohort.checked_scale()?)
}

/// Rescale between two scales that have already been validated.
pub fn rescale(raw: f64, exam: Scale, cohort: Scale) -> Result<f64, EvalError> {
    if raw.is_nan() {
        return Err(EvalError::InvalidScore { value: raw });
    }
    debug_assert!(exam.is_valid() && cohort.is_valid());

    if exam == cohort {
        return Ok(cohort.clamp(raw));
    }
    // Exact at the boundaries, and everything outside the exam scale
    // collapses onto the nearest cohort bound.
    if raw <= exam.min {
        return Ok(cohort.min);
    }
    if raw >= exam.max {
        return Ok(cohort.max);
    }

    let position = (raw - exam.min) / exam.span();
    Ok(cohort.clamp(position * cohort.span() + cohort.min))
}

// ---------------------------------------------------------------------------
// Pass determiner
// ---------------------------------------------------------------------------

/// A normalized score passes when it reaches the cohort minimum.
pub fn is_passing(normalized: f64, cohort_min: f64) -> bool {
    normalized >= cohort_min
}

// ---------------------------------------------------------------------------
// Per-exam view
// ---------------------------------------------------------------------------

/// One graded submission as shown to a student.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeView {
    pub raw_score: f64,
    pub normalized_score: f64,
    pub passed: bool,
}

impl GradeView {
    /// Copy with the normalized score rounded for display.
    pub fn rounded(&self) -> Self {
        Self {
            normalized_score: round1(self.normalized_score),
            ..*self
        }
    }
}

/// Normalize a raw exam score and derive its pass flag.
pub fn grade_view(raw: f64, exam: &Exam, cohort: &Cohort) -> Result<GradeView, EvalError> {
    let normalized_score = normalize_grade(raw, exam, cohort)?;
    Ok(GradeView {
        raw_score: raw,
        normalized_score,
        passed: is_passing(normalized_score, cohort.pass_min),
    })
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
