//! The `cohortgrade verify` command.

use std::path::PathBuf;

use anyhow::Result;

use cohortgrade_core::certificate::{CertificateLookup, CertificateView};

/// Exit code for a key that matches no certificate.
const NOT_FOUND_EXIT_CODE: i32 = 2;

pub async fn execute(gradebook_path: PathBuf, key: String, format: String) -> Result<()> {
    let engine = super::open_engine(&gradebook_path, 1)?;
    let lookup = engine.verify_certificate(key.trim()).await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&lookup)?),
        _ => match &lookup {
            CertificateLookup::Found(view) => print_certificate(view),
            CertificateLookup::NotFound { key } => println!("Certificate not found: {key}"),
        },
    }

    if !lookup.is_found() {
        std::process::exit(NOT_FOUND_EXIT_CODE);
    }

    Ok(())
}

fn print_certificate(view: &CertificateView) {
    println!("Certificate:  {} ({})", view.certificate_id, view.unique_code);
    println!("Status:       {}", view.status);
    println!("Student:      {} [{}]", view.student_name, view.student_id);
    println!("Course:       {} [{}]", view.course_title, view.course_id);
    println!("Cohort:       {} [{}]", view.cohort_code, view.cohort_id);
    println!("Issued:       {}", view.issued_at.format("%Y-%m-%d"));
    match view.final_score {
        Some(score) => println!("Final score:  {score:.1}"),
        None => println!("Final score:  -"),
    }
    if let Some(url) = &view.document_url {
        println!("Document:     {url}");
    }
}
