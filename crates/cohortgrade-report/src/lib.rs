//! cohortgrade-report: Rendering of cohort reports for people.
//!
//! JSON persistence lives on [`cohortgrade_core::report::CohortReport`]; this
//! crate turns a report into a self-contained HTML page.

pub mod html;

pub use html::{generate_html, write_html_report};
