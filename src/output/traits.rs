//! Record sink trait and output errors

use crate::record::EntityRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Append-only destination for finished records
///
/// Implementations receive whole batches; a batch is either written or the
/// call fails, and earlier batches stay written either way.
#[async_trait]
pub trait RecordSink: Send {
    async fn push_batch(&mut self, records: &[EntityRecord]) -> OutputResult<()>;

    /// Short name for log lines
    fn name(&self) -> &'static str;
}
