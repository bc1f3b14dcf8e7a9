//! The `cohortgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use cohortgrade_core::parser::{self, Severity};

pub fn execute(gradebook_path: PathBuf) -> Result<()> {
    let books = parser::load_gradebooks(&gradebook_path)?;

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for book in &books {
        println!(
            "Cohort: {} ({} exams, {} students, {} grades, {} certificates)",
            book.cohort.id,
            book.exams.len(),
            book.enrollments.len(),
            book.grades.len(),
            book.certificates.len()
        );

        let findings = parser::validate_gradebook(book);
        for f in &findings {
            let prefix = f
                .subject
                .as_ref()
                .map(|subject| format!("  [{subject}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} {}: {}", f.severity, f.message);
        }
        total_errors += findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        total_warnings += findings.len();
    }
    total_warnings -= total_errors;

    if books.is_empty() {
        println!("No gradebooks found.");
    } else if total_warnings == 0 && total_errors == 0 {
        println!("All gradebooks valid.");
    } else {
        println!("\n{total_errors} error(s), {total_warnings} warning(s) found.");
    }

    anyhow::ensure!(
        total_errors == 0,
        "{total_errors} gradebook error(s) would prevent evaluation"
    );

    Ok(())
}
