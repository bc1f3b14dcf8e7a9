//! In-memory gradebook store.
//!
//! Backs the CLI (gradebooks loaded from TOML files) and the test suites.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::model::{CertificateRecord, Gradebook};
use crate::traits::GradebookStore;

/// A [`GradebookStore`] over gradebooks held in memory, keyed by cohort id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    gradebooks: BTreeMap<String, Gradebook>,
    /// Number of store calls served.
    call_count: AtomicU32,
}

impl MemoryStore {
    pub fn new(gradebooks: impl IntoIterator<Item = Gradebook>) -> Self {
        let mut store = Self::default();
        for book in gradebooks {
            store.insert(book);
        }
        store
    }

    /// Add or replace a gradebook. Returns the one it replaced, if any.
    pub fn insert(&mut self, gradebook: Gradebook) -> Option<Gradebook> {
        let replaced = self
            .gradebooks
            .insert(gradebook.cohort.id.clone(), gradebook);
        if let Some(old) = &replaced {
            tracing::warn!(
                cohort = %old.cohort.id,
                "gradebook for cohort '{}' replaces an earlier one",
                old.cohort.id
            );
        }
        replaced
    }

    pub fn len(&self) -> usize {
        self.gradebooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gradebooks.is_empty()
    }

    /// Get the number of calls made to this store.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn find_certificate<F>(&self, matches: F) -> Option<CertificateRecord>
    where
        F: Fn(&crate::model::Certificate) -> bool,
    {
        self.gradebooks.values().find_map(|book| {
            book.certificates
                .iter()
                .find(|c| matches(c))
                .map(|c| book.certificate_record(c))
        })
    }
}

#[async_trait]
impl GradebookStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn cohort_ids(&self) -> anyhow::Result<Vec<String>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.gradebooks.keys().cloned().collect())
    }

    async fn gradebook(&self, cohort_id: &str) -> anyhow::Result<Option<Gradebook>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.gradebooks.get(cohort_id).cloned())
    }

    async fn certificate_by_id(&self, id: &str) -> anyhow::Result<Option<CertificateRecord>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.find_certificate(|c| c.id == id))
    }

    async fn certificate_by_code(
        &self,
        code: &str,
    ) -> anyhow::Result<Option<CertificateRecord>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.find_certificate(|c| c.unique_code == code))
    }
}
