//! Fixed-size batching in front of a record sink

use crate::output::traits::{OutputResult, RecordSink};
use crate::record::EntityRecord;

/// Buffers records and hands them to the sink `batch_size` at a time
pub struct OutputBatcher {
    sink: Box<dyn RecordSink>,
    buffer: Vec<EntityRecord>,
    batch_size: usize,
    written: usize,
}

impl OutputBatcher {
    pub fn new(sink: Box<dyn RecordSink>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            sink,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            written: 0,
        }
    }

    /// Buffers a record, flushing when the batch is full
    pub async fn push(&mut self, record: EntityRecord) -> OutputResult<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Writes whatever is buffered
    ///
    /// On failure the batch stays buffered so a later flush can retry it.
    pub async fn flush(&mut self) -> OutputResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.sink.push_batch(&self.buffer).await?;
        self.written += self.buffer.len();
        tracing::info!(
            "Pushed batch of {} agents to {} ({} total)",
            self.buffer.len(),
            self.sink.name(),
            self.written
        );
        self.buffer.clear();
        Ok(())
    }

    /// Final flush; returns the number of records written over the batcher's life
    pub async fn finish(&mut self) -> OutputResult<usize> {
        self.flush().await?;
        Ok(self.written)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
