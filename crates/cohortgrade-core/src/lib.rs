//! cohortgrade-core: Academic evaluation engine.
//!
//! Normalizes exam scores onto a cohort's grading scale, aggregates cohort
//! and exam statistics, ranks students, and validates certificates. The
//! grading modules are pure functions over in-memory data; data access goes
//! through the [`traits::GradebookStore`] capability.

pub mod certificate;
pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod ranking;
pub mod report;
pub mod statistics;
pub mod store;
pub mod traits;

pub use error::EvalError;
