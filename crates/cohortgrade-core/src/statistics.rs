//! Per-cohort and per-exam grade statistics.
//!
//! All figures are computed at full precision over normalized scores;
//! `rounded()` produces the one-decimal display copy. A cohort with nothing
//! graded yet is a valid state and yields explicit zeros.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::grading::{is_passing, round1};
use crate::model::Exam;

/// One (exam, student) cell of a cohort's grade sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub exam_id: String,
    pub student_id: String,
    /// Normalized score, or `None` if the submission is not graded yet.
    pub normalized_score: Option<f64>,
}

impl GradeEntry {
    pub fn graded(exam_id: &str, student_id: &str, normalized_score: f64) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            student_id: student_id.to_string(),
            normalized_score: Some(normalized_score),
        }
    }

    pub fn ungraded(exam_id: &str, student_id: &str) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            student_id: student_id.to_string(),
            normalized_score: None,
        }
    }
}

/// Aggregate statistics for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStatistics {
    /// Exams configured for the cohort, graded or not.
    pub total_exams: usize,
    /// Entries that carry a score.
    pub total_graded: usize,
    pub average: f64,
    pub pass_count: usize,
    pub fail_count: usize,
    /// Percentage in `[0, 100]`.
    pub pass_rate: f64,
}

impl CohortStatistics {
    /// Copy with every float rounded to one decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            average: round1(self.average),
            pass_rate: round1(self.pass_rate),
            ..self.clone()
        }
    }
}

/// Statistics for a single exam within a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamStatistics {
    pub exam_id: String,
    pub exam_name: String,
    pub total_graded: usize,
    pub average: f64,
    pub pass_count: usize,
    pub fail_count: usize,
    pub pass_rate: f64,
}

impl ExamStatistics {
    pub fn rounded(&self) -> Self {
        Self {
            average: round1(self.average),
            pass_rate: round1(self.pass_rate),
            ..self.clone()
        }
    }
}

/// Running totals over present scores.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    graded: usize,
    sum: f64,
    passed: usize,
}

impl Tally {
    fn add(&mut self, score: f64, pass_min: f64) {
        self.graded += 1;
        self.sum += score;
        if is_passing(score, pass_min) {
            self.passed += 1;
        }
    }

    fn average(&self) -> f64 {
        if self.graded == 0 {
            0.0
        } else {
            self.sum / self.graded as f64
        }
    }

    fn failed(&self) -> usize {
        self.graded - self.passed
    }

    fn pass_rate(&self) -> f64 {
        if self.graded == 0 {
            0.0
        } else {
            self.passed as f64 / self.graded as f64 * 100.0
        }
    }
}

/// Arithmetic mean, defined as `0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Compute cohort statistics over a grade sheet.
///
/// Ungraded entries count toward neither passes nor failures.
pub fn aggregate(total_exams: usize, entries: &[GradeEntry], pass_min: f64) -> CohortStatistics {
    let mut tally = Tally::default();
    for score in entries.iter().filter_map(|e| e.normalized_score) {
        tally.add(score, pass_min);
    }

    CohortStatistics {
        total_exams,
        total_graded: tally.graded,
        average: tally.average(),
        pass_count: tally.passed,
        fail_count: tally.failed(),
        pass_rate: tally.pass_rate(),
    }
}

/// Compute statistics for every configured exam, in configuration order.
///
/// Exams without submissions are included with zeroed figures. Entries for
/// exams not in `exams` are ignored.
pub fn per_exam(exams: &[Exam], entries: &[GradeEntry], pass_min: f64) -> Vec<ExamStatistics> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for entry in entries {
        if let Some(score) = entry.normalized_score {
            tallies
                .entry(entry.exam_id.as_str())
                .or_default()
                .add(score, pass_min);
        }
    }

    exams
        .iter()
        .map(|exam| {
            let tally = tallies.get(exam.id.as_str()).copied().unwrap_or_default();
            ExamStatistics {
                exam_id: exam.id.clone(),
                exam_name: exam.name.clone(),
                total_graded: tally.graded,
                average: tally.average(),
                pass_count: tally.passed,
                fail_count: tally.failed(),
                pass_rate: tally.pass_rate(),
            }
        })
        .collect()
}
