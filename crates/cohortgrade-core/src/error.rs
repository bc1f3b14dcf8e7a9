//! Evaluation error types.
//!
//! Degenerate grading scales are configuration errors and are raised rather
//! than turned into `NaN` or infinite scores. A certificate lookup that
//! matches nothing is its own variant so callers can tell an expected miss
//! apart from a failing data store.

use thiserror::Error;

/// Errors produced by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An exam or cohort declares a scale with `max <= min` (or a non-finite bound).
    #[error("{entity} '{id}' has a degenerate scale [{min}, {max}]")]
    Configuration {
        entity: String,
        id: String,
        min: f64,
        max: f64,
    },

    /// A raw score that is not a number (`NaN`).
    #[error("invalid score: {value}")]
    InvalidScore { value: f64 },

    /// No certificate matches the lookup key, neither as id nor as code.
    #[error("certificate not found: {key}")]
    CertificateNotFound { key: String },

    /// The data store holds no cohort with this id.
    #[error("unknown cohort: {id}")]
    UnknownCohort { id: String },

    /// The injected data store failed.
    #[error("store error: {0}")]
    Store(String),
}

impl EvalError {
    /// Returns `true` for "nothing matched" outcomes, which are normal results
    /// rather than failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EvalError::CertificateNotFound { .. } | EvalError::UnknownCohort { .. }
        )
    }

    /// Returns `true` if the error comes from bad grading configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EvalError::Configuration { .. } | EvalError::InvalidScore { .. }
        )
    }

    pub(crate) fn store(err: anyhow::Error) -> Self {
        EvalError::Store(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let not_found = EvalError::CertificateNotFound { key: "X".into() };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_configuration());

        let config = EvalError::Configuration {
            entity: "exam".into(),
            id: "e1".into(),
            min: 10.0,
            max: 10.0,
        };
        assert!(config.is_configuration());
        assert!(!config.is_not_found());

        assert!(!EvalError::Store("disk full".into()).is_not_found());
    }

    #[test]
    fn display_messages() {
        let err = EvalError::Configuration {
            entity: "cohort".into(),
            id: "2024-a".into(),
            min: 100.0,
            max: 0.0,
        };
        assert_eq!(
            err.to_string(),
            "cohort '2024-a' has a degenerate scale [100, 0]"
        );
        let err = EvalError::store(anyhow::anyhow!("connection reset"));
        assert_eq!(err.to_string(), "store error: connection reset");
    }
}
