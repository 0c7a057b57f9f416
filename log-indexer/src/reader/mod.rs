//! Record reader for the log indexer ingest.
//!
//! Reads the source in chunks of one queue capacity, decodes each line and
//! hands the records to the batch publisher through the [`BatchQueue`].

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info, instrument};

use crate::errors::IngestError;
use crate::queue::{BatchQueue, QueueItem};
use crate::schema::{Record, RecordDecoder};

/// Producer side of the ingest.
///
/// For every chunk the reader:
/// 1. reads up to `capacity` lines,
/// 2. decodes and enqueues each one,
/// 3. pads a short chunk with sentinels so the queue is always filled,
/// 4. waits for the publisher to mark every item processed.
///
/// An empty read ends the stream with [`QueueItem::EndOfStream`].
pub struct RecordReader<R> {
    lines: Lines<R>,
    decoder: Arc<dyn RecordDecoder>,
    queue: Arc<BatchQueue<Record>>,
    lines_read: usize,
}

impl<R> RecordReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Create a reader over a line-oriented source.
    pub fn new(source: R, decoder: Arc<dyn RecordDecoder>, queue: Arc<BatchQueue<Record>>) -> Self {
        Self {
            lines: source.lines(),
            decoder,
            queue,
            lines_read: 0,
        }
    }

    /// Read the whole source into the queue.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of lines read once the source is exhausted
    /// * `Err(IngestError::DecodeError)` - On the first line that fails to decode
    /// * `Err(IngestError::SourceError)` - If reading the source fails
    #[instrument(skip(self), fields(capacity = self.queue.capacity()))]
    pub async fn run(mut self) -> Result<usize, IngestError> {
        loop {
            let chunk = self.read_chunk().await?;
            if chunk.is_empty() {
                self.queue.send(QueueItem::EndOfStream)?;
                info!(lines_read = self.lines_read, "Source exhausted");
                return Ok(self.lines_read);
            }

            let record_count = chunk.len();
            for line in chunk {
                self.lines_read += 1;
                let record = self
                    .decoder
                    .decode(&line)
                    .map_err(|e| IngestError::decode(self.lines_read, e.to_string()))?;
                self.queue.send(QueueItem::Record(record))?;
            }

            // The queue was empty at the start of the chunk, so this fills it exactly
            let padding = self.queue.capacity() - record_count;
            for _ in 0..padding {
                self.queue.send(QueueItem::Sentinel)?;
            }

            debug!(
                records = record_count,
                padding = padding,
                lines_read = self.lines_read,
                "Chunk enqueued, waiting for publisher"
            );

            self.queue.await_drained().await;
        }
    }

    /// Read up to one queue capacity of lines.
    async fn read_chunk(&mut self) -> Result<Vec<String>, IngestError> {
        let capacity = self.queue.capacity();
        let mut chunk = Vec::with_capacity(capacity);

        while chunk.len() < capacity {
            match self.lines.next_line().await? {
                Some(line) => chunk.push(line),
                None => break,
            }
        }

        Ok(chunk)
    }
}
