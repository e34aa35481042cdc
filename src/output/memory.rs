//! In-memory sink for tests and embedding

use crate::output::traits::{OutputResult, RecordSink};
use crate::record::EntityRecord;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Keeps every pushed record in memory
///
/// Clones share the same storage, so a caller can hand one clone to the crawl
/// and inspect the results through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<Vec<EntityRecord>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in push order
    pub fn records(&self) -> Vec<EntityRecord> {
        self.lock_batches().iter().flatten().cloned().collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.lock_batches().iter().map(Vec::len).collect()
    }

    fn lock_batches(&self) -> std::sync::MutexGuard<'_, Vec<Vec<EntityRecord>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn push_batch(&mut self, records: &[EntityRecord]) -> OutputResult<()> {
        self.lock_batches().push(records.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
