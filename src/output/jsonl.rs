//! JSON-lines dataset sink

use crate::output::traits::{OutputResult, RecordSink};
use crate::record::EntityRecord;
use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends one JSON object per record to a file
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Opens `path` for appending, creating it and its parent directory if needed
    pub fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn push_batch(&mut self, records: &[EntityRecord]) -> OutputResult<()> {
        for record in records {
            serde_json::to_writer(&mut self.writer, record)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
