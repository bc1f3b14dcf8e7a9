//! The `cohortgrade compare` command.

use std::path::PathBuf;

use anyhow::Result;

use cohortgrade_core::report::CohortReport;

use crate::config::load_config_from;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: Option<f64>,
    fail_on_regression: bool,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let threshold = match threshold {
        Some(t) => t,
        None => load_config_from(config_path.as_deref())?.regression_threshold,
    };
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = CohortReport::load_json(&baseline_path)?;
    let current = CohortReport::load_json(&current_path)?;
    if baseline.cohort.id != current.cohort.id {
        eprintln!(
            "Warning: comparing different cohorts ({} vs {})",
            baseline.cohort.id, current.cohort.id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );
            println!(
                "Cohort average {:+.1}, pass rate {:+.1}%",
                report.cohort_average_delta, report.pass_rate_delta
            );

            for (title, changes) in [
                ("Regressions", &report.regressions),
                ("Improvements", &report.improvements),
            ] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {:.1} -> {:.1} ({:+.1})",
                        c.student_id, c.baseline_average, c.current_average, c.delta
                    );
                }
            }

            if report.new_students > 0 {
                println!("\n{} new student(s)", report.new_students);
            }
            if report.removed_students > 0 {
                println!("{} removed student(s)", report.removed_students);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
