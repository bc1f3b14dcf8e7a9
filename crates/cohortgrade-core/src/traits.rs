//! Data-access capability consumed by the evaluation engine.
//!
//! The engine never talks to a database directly. Whatever holds courses,
//! enrollments and grades implements [`GradebookStore`] and is injected into
//! [`crate::engine::EvaluationEngine`].

use async_trait::async_trait;

use crate::model::{CertificateRecord, Gradebook};

/// Read access to cohort snapshots and issued certificates.
///
/// `Ok(None)` means "no such record"; `Err` is reserved for failures of the
/// store itself, so callers can tell a miss from an outage.
#[async_trait]
pub trait GradebookStore: Send + Sync {
    /// Human-readable store name (e.g. "memory").
    fn name(&self) -> &str;

    /// Ids of every cohort the store knows about.
    async fn cohort_ids(&self) -> anyhow::Result<Vec<String>>;

    /// A consistent snapshot of one cohort.
    async fn gradebook(&self, cohort_id: &str) -> anyhow::Result<Option<Gradebook>>;

    /// Look a certificate up by its internal id.
    async fn certificate_by_id(&self, id: &str) -> anyhow::Result<Option<CertificateRecord>>;

    /// Look a certificate up by its public unique code.
    async fn certificate_by_code(&self, code: &str)
        -> anyhow::Result<Option<CertificateRecord>>;
}
