//! Output module for finished agent records
//!
//! This module handles:
//! - Batching records in front of a sink
//! - Writing records as JSON lines or into SQLite
//! - Recording the end-of-run summary

mod batcher;
mod jsonl;
mod memory;
mod sqlite;
mod summary;
mod traits;

pub use batcher::OutputBatcher;
pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use sqlite::SqliteSink;
pub use summary::{write_summary, RunStatus, RunSummary};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the sink the output configuration asks for
pub fn open_sink(config: &OutputConfig) -> OutputResult<Box<dyn RecordSink>> {
    let path = Path::new(&config.dataset_path);
    let sink: Box<dyn RecordSink> = match config.format {
        OutputFormat::Jsonl => Box::new(JsonLinesSink::open(path)?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(path)?),
    };
    tracing::info!("Writing {} dataset to {}", sink.name(), path.display());
    Ok(sink)
}
