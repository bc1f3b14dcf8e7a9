//! Cohort report types with JSON persistence and regression detection.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::GradeView;
use crate::ranking::{Ranking, RankingView};
use crate::statistics::{CohortStatistics, ExamStatistics};

/// A complete evaluation of one cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the cohort.
    pub cohort: CohortSummary,
    /// Cohort-wide statistics at full precision.
    pub statistics: CohortStatistics,
    /// Per-exam statistics, in exam configuration order.
    pub exams: Vec<ExamStatistics>,
    /// Students ranked by personal average.
    pub ranking: Ranking,
    /// Every graded submission, normalized.
    pub grades: Vec<StudentGrade>,
}

/// Summary of a cohort (without the full gradebook).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSummary {
    pub id: String,
    pub code: String,
    pub course_id: String,
    pub course_title: String,
    pub pass_min: f64,
    pub pass_max: f64,
    pub exam_count: usize,
    pub enrolled_count: usize,
}

/// A normalized grade tagged with its student and exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentGrade {
    pub student_id: String,
    pub exam_id: String,
    #[serde(flatten)]
    pub view: GradeView,
}

impl CohortReport {
    /// The ranking view for one student of this cohort.
    pub fn view_for(&self, student_id: &str) -> RankingView {
        self.ranking.view_for(student_id)
    }

    /// Grades of one student, in report order.
    pub fn grades_of<'a>(&'a self, student_id: &'a str) -> impl Iterator<Item = &'a StudentGrade> {
        self.grades.iter().filter(move |g| g.student_id == student_id)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: CohortReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline of the same cohort.
    ///
    /// A student's personal average must move by more than `threshold`
    /// points to count as a regression or an improvement.
    pub fn compare(&self, baseline: &CohortReport, threshold: f64) -> ReportComparison {
        let averages = |report: &CohortReport| -> HashMap<String, f64> {
            report
                .ranking
                .ranked
                .iter()
                .map(|r| (r.student_id.clone(), r.average))
                .collect()
        };

        let baseline_averages = averages(baseline);
        let current_averages = averages(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_students = 0usize;

        for (student_id, &current) in &current_averages {
            let Some(&before) = baseline_averages.get(student_id) else {
                new_students += 1;
                continue;
            };
            let change = AverageChange {
                student_id: student_id.clone(),
                baseline_average: before,
                current_average: current,
                delta: current - before,
            };
            if change.delta < -threshold {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_students = baseline_averages
            .keys()
            .filter(|k| !current_averages.contains_key(*k))
            .count();

        // HashMap iteration order is arbitrary; sort worst drop / best gain first.
        regressions.sort_by(|a, b| {
            a.delta
                .total_cmp(&b.delta)
                .then_with(|| a.student_id.cmp(&b.student_id))
        });
        improvements.sort_by(|a, b| {
            b.delta
                .total_cmp(&a.delta)
                .then_with(|| a.student_id.cmp(&b.student_id))
        });

        ReportComparison {
            cohort_id: self.cohort.id.clone(),
            cohort_average_delta: self.ranking.cohort_average - baseline.ranking.cohort_average,
            pass_rate_delta: self.statistics.pass_rate - baseline.statistics.pass_rate,
            regressions,
            improvements,
            unchanged,
            new_students,
            removed_students,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportComparison {
    pub cohort_id: String,
    /// Change in the mean of personal averages.
    pub cohort_average_delta: f64,
    /// Change in pass rate, in percentage points.
    pub pass_rate_delta: f64,
    /// Students whose average went down.
    pub regressions: Vec<AverageChange>,
    /// Students whose average went up.
    pub improvements: Vec<AverageChange>,
    /// Students with no significant change.
    pub unchanged: usize,
    /// Ranked now but not in the baseline.
    pub new_students: usize,
    /// Ranked in the baseline but not now.
    pub removed_students: usize,
}

/// A change in one student's personal average.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AverageChange {
    pub student_id: String,
    pub baseline_average: f64,
    pub current_average: f64,
    pub delta: f64,
}

impl ReportComparison {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged \
             (cohort average {:+.1}, pass rate {:+.1}%)\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.cohort_average_delta,
            self.pass_rate_delta,
        ));

        for (title, rows) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if rows.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Student | Baseline | Current | Delta |\n");
            md.push_str("|---------|----------|---------|-------|\n");
            for c in rows {
                md.push_str(&format!(
                    "| {} | {:.1} | {:.1} | {:+.1} |\n",
                    c.student_id, c.baseline_average, c.current_average, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
