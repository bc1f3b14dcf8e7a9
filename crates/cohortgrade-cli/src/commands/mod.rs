//! Subcommand implementations.

pub mod compare;
pub mod evaluate;
pub mod init;
pub mod rank;
pub mod validate;
pub mod verify;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use cohortgrade_core::engine::{EngineConfig, EvaluationEngine};
use cohortgrade_core::parser;
use cohortgrade_core::store::MemoryStore;

/// Load gradebooks from a file or directory and wrap them in an engine.
pub(crate) fn open_engine(gradebook_path: &Path, parallelism: usize) -> Result<EvaluationEngine> {
    let books = parser::load_gradebooks(gradebook_path)?;
    anyhow::ensure!(
        !books.is_empty(),
        "no gradebooks found in {}",
        gradebook_path.display()
    );
    tracing::debug!(count = books.len(), "gradebooks loaded");

    let store = Arc::new(MemoryStore::new(books));
    Ok(EvaluationEngine::new(store, EngineConfig { parallelism }))
}
