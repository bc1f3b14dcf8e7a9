//! The `cohortgrade evaluate` command.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;

use cohortgrade_core::engine::ProgressReporter;
use cohortgrade_core::grading::round1;
use cohortgrade_core::report::CohortReport;
use cohortgrade_report::write_html_report;

use crate::config::load_config_from;

/// Console progress reporter.
#[derive(Default)]
struct ConsoleReporter {
    failed: AtomicUsize,
}

impl ProgressReporter for ConsoleReporter {
    fn on_cohort_start(&self, cohort_id: &str) {
        eprintln!("  Evaluating: {cohort_id}");
    }

    fn on_cohort_complete(&self, report: &CohortReport) {
        eprintln!(
            "  Done: {} [{}] {} graded, {} ranked",
            report.cohort.id,
            report.cohort.code,
            report.statistics.total_graded,
            report.ranking.total_graded(),
        );
    }

    fn on_cohort_error(&self, cohort_id: &str, error: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        eprintln!("  ERROR: {cohort_id}: {error}");
    }

    fn on_run_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} cohorts evaluated, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    gradebook_path: PathBuf,
    output: Option<PathBuf>,
    format: Option<String>,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let output = output.unwrap_or(config.output_dir);
    let format = format.unwrap_or(config.default_format);
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let formats: Vec<&str> = match format.as_str() {
        "all" => vec!["json", "html"],
        "none" => vec![],
        other => other.split(',').map(str::trim).collect(),
    };
    for fmt in &formats {
        anyhow::ensure!(
            matches!(*fmt, "json" | "html"),
            "unknown format: '{fmt}' (expected json, html, all or none)"
        );
    }

    let engine = super::open_engine(&gradebook_path, parallelism)?;
    let reporter = ConsoleReporter::default();
    let reports = engine.evaluate_all(&reporter).await?;

    if reports.is_empty() {
        anyhow::bail!("no cohort could be evaluated");
    }

    print_summary(&reports);
    write_reports(&reports, &formats, &output)?;

    // Reports of the healthy cohorts are kept; the run still fails.
    let failed = reporter.failed.load(Ordering::Relaxed);
    anyhow::ensure!(failed == 0, "{failed} cohort(s) failed to evaluate");

    Ok(())
}

fn write_reports(reports: &[CohortReport], formats: &[&str], output: &Path) -> Result<()> {
    if formats.is_empty() {
        return Ok(());
    }

    std::fs::create_dir_all(output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for report in reports {
        let stem = format!("{}-{timestamp}", report.cohort.id);
        for fmt in formats {
            match *fmt {
                "json" => {
                    let path = output.join(format!("{stem}.json"));
                    report.save_json(&path)?;
                    eprintln!("Report saved to: {}", path.display());
                }
                "html" => {
                    let path = output.join(format!("{stem}.html"));
                    write_html_report(report, &path)?;
                    eprintln!("HTML report: {}", path.display());
                }
                other => anyhow::bail!("unknown format: '{other}'"),
            }
        }
    }

    Ok(())
}

fn print_summary(reports: &[CohortReport]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Cohort",
        "Course",
        "Enrolled",
        "Graded",
        "Average",
        "Pass rate",
        "Best",
    ]);

    for report in reports {
        let stats = report.statistics.rounded();
        table.add_row(vec![
            Cell::new(&report.cohort.code),
            Cell::new(&report.cohort.course_title),
            Cell::new(report.ranking.total_enrolled),
            Cell::new(report.ranking.total_graded()),
            Cell::new(format!("{:.1}", stats.average)),
            Cell::new(format!("{:.1}%", stats.pass_rate)),
            Cell::new(format!("{:.1}", round1(report.ranking.best_average))),
        ]);
    }

    println!("{table}");
}
