//! The `cohortgrade rank` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use cohortgrade_core::grading::round1;
use cohortgrade_core::ranking::{Ranking, RankingView};

pub async fn execute(
    gradebook_path: PathBuf,
    cohort_id: String,
    student_id: Option<String>,
    format: String,
) -> Result<()> {
    let engine = super::open_engine(&gradebook_path, 1)?;

    match student_id {
        Some(student_id) => {
            let view = engine
                .student_position(&cohort_id, &student_id)
                .await
                .with_context(|| format!("failed to rank cohort '{cohort_id}'"))?
                .rounded();
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&view)?),
                _ => print_view(&view),
            }
        }
        None => {
            let report = engine
                .evaluate_cohort(&cohort_id)
                .await
                .with_context(|| format!("failed to rank cohort '{cohort_id}'"))?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report.ranking)?),
                _ => print_ranking(&report.ranking),
            }
        }
    }

    Ok(())
}

fn print_view(view: &RankingView) {
    let or_dash = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    let signed = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:+.1}"));

    println!("Student:          {}", view.student_id);
    println!("Rank:             {}", view.my_rank);
    println!("Average:          {}", or_dash(view.my_average));
    println!("Best average:     {:.1}", view.best_average);
    println!("Cohort average:   {:.1}", view.cohort_average);
    println!("Delta to best:    {}", signed(view.delta_to_best));
    println!("Delta to average: {}", signed(view.delta_to_average));
    println!(
        "Graded:           {}/{} students",
        view.total_graded, view.total_enrolled
    );
    println!("\n{}", view.message);
}

fn print_ranking(ranking: &Ranking) {
    let mut table = Table::new();
    table.set_header(vec!["Rank", "Student", "Average", "Graded exams"]);

    for student in &ranking.ranked {
        table.add_row(vec![
            Cell::new(format!("#{}", student.rank)),
            Cell::new(&student.student_id),
            Cell::new(format!("{:.1}", round1(student.average))),
            Cell::new(student.graded_exams),
        ]);
    }
    for student_id in &ranking.unranked {
        table.add_row(vec![
            Cell::new("unranked"),
            Cell::new(student_id),
            Cell::new("-"),
            Cell::new(0),
        ]);
    }

    println!("{table}");
    println!(
        "Cohort average {:.1}, best {:.1}, {}/{} students graded",
        round1(ranking.cohort_average),
        round1(ranking.best_average),
        ranking.total_graded(),
        ranking.total_enrolled
    );
}
