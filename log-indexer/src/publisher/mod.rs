//! Batch publisher for the log indexer ingest.
//!
//! Drains full batches from the [`BatchQueue`] and writes them to the search
//! index with one bulk request per batch.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::IngestError;
use crate::queue::{BatchQueue, QueueItem};
use crate::schema::Record;
use log_indexer_repository::SearchIndexProvider;

/// Configuration for the batch publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Target index name.
    pub index: String,
    /// Abort the ingest when a bulk request fails instead of skipping the batch.
    pub fail_fast: bool,
    /// Log skipped batches and rejected documents at `warn` level.
    pub verbose: bool,
}

/// Counters accumulated by the publisher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    /// Bulk requests attempted.
    pub batches: u64,
    /// Documents submitted, whether or not the request succeeded.
    pub attempted: u64,
    /// Documents the cluster reported as indexed.
    pub succeeded: u64,
}

/// A drained batch and whether the stream ended with it.
struct DrainedBatch {
    records: Vec<Record>,
    end_of_stream: bool,
}

/// Consumer side of the ingest.
///
/// The publisher owns the running totals. Items are marked processed as they
/// are drained, before the bulk request is sent, so the reader can load the
/// next chunk while the current batch is being written.
pub struct BatchPublisher {
    provider: Arc<dyn SearchIndexProvider>,
    queue: Arc<BatchQueue<Record>>,
    config: PublisherConfig,
    totals: RunningTotals,
}

impl BatchPublisher {
    /// Create a new publisher bound to a queue and a search provider.
    pub fn new(
        provider: Arc<dyn SearchIndexProvider>,
        queue: Arc<BatchQueue<Record>>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            provider,
            queue,
            config,
            totals: RunningTotals::default(),
        }
    }

    /// Publish batches until the end of the stream.
    ///
    /// Returns the final totals after draining `EndOfStream`, or early when a
    /// shutdown signal is received while waiting for a batch.
    ///
    /// # Returns
    ///
    /// * `Ok(RunningTotals)` - When the stream ended or shutdown was requested
    /// * `Err(IngestError::BulkWriteError)` - If a bulk request failed with fail-fast enabled
    #[instrument(skip(self, shutdown), fields(index = %self.config.index))]
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RunningTotals, IngestError> {
        loop {
            tokio::select! {
                biased;
                Ok(()) = shutdown.recv() => {
                    info!("Publisher received shutdown signal");
                    return Ok(self.totals);
                }
                _ = self.queue.wait_ready() => {}
            }

            let batch = self.drain_batch();

            if !batch.records.is_empty() {
                self.publish(batch.records).await?;
            }

            if batch.end_of_stream {
                info!(
                    batches = self.totals.batches,
                    attempted = self.totals.attempted,
                    succeeded = self.totals.succeeded,
                    "End of stream reached"
                );
                return Ok(self.totals);
            }
        }
    }

    /// Take the items currently in the queue, marking each one processed.
    ///
    /// Only the items present on entry are taken, so records the reader
    /// enqueues once the last one is marked belong to the next batch.
    fn drain_batch(&self) -> DrainedBatch {
        let pending = self.queue.len();
        let mut records = Vec::with_capacity(pending);
        let mut end_of_stream = false;

        for _ in 0..pending {
            let Some(item) = self.queue.try_receive() else {
                break;
            };
            match item {
                QueueItem::Record(record) => records.push(record),
                QueueItem::Sentinel => {}
                QueueItem::EndOfStream => end_of_stream = true,
            }
            self.queue.mark_processed();
        }

        DrainedBatch {
            records,
            end_of_stream,
        }
    }

    /// Send one batch and update the totals.
    async fn publish(&mut self, records: Vec<Record>) -> Result<(), IngestError> {
        let documents: Vec<Value> = records.into_iter().map(Record::into_document).collect();
        let count = documents.len();

        self.totals.batches += 1;
        self.totals.attempted += count as u64;

        match self
            .provider
            .bulk_index_documents(&self.config.index, &documents)
            .await
        {
            Ok(summary) => {
                self.totals.succeeded += summary.succeeded as u64;

                if summary.failed > 0 {
                    warn!(
                        succeeded = summary.succeeded,
                        failed = summary.failed,
                        "Bulk write completed with some failures"
                    );
                    if self.config.verbose {
                        for failure in summary.failures() {
                            warn!(
                                position = failure.position,
                                error = failure.error.as_deref().unwrap_or("unknown"),
                                "Document was not indexed"
                            );
                        }
                    }
                }
            }
            Err(e) => {
                if self.config.fail_fast {
                    error!(error = %e, count = count, "Bulk write failed, aborting");
                    return Err(IngestError::bulk_write(format!(
                        "Failed to bulk index {} documents: {}",
                        count, e
                    )));
                }

                if self.config.verbose {
                    warn!(error = %e, count = count, "Encountered exception, skipping batch");
                } else {
                    debug!(error = %e, count = count, "Bulk write failed, skipping batch");
                }
            }
        }

        info!(
            batch = self.totals.batches,
            succeeded = self.totals.succeeded,
            attempted = self.totals.attempted,
            "Processed batch: results {}/{} documents successfully indexed",
            self.totals.succeeded,
            self.totals.attempted
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use log_indexer_repository::{BatchOperationResult, BatchOperationSummary, SearchIndexError};
    use log_indexer_shared::MappingDeclaration;
    use serde_json::json;
    use std::num::NonZeroUsize;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Mock search provider recording each bulk request.
    struct MockSearchProvider {
        batches: Mutex<Vec<Vec<Value>>>,
        fail: bool,
        /// Documents rejected per batch, counted from the end.
        rejected_per_batch: usize,
    }

    impl MockSearchProvider {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail: false,
                rejected_per_batch: 0,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn rejecting(rejected_per_batch: usize) -> Self {
            Self {
                rejected_per_batch,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockSearchProvider {
        async fn ensure_index_exists(
            &self,
            _index: &str,
            _mapping: &MappingDeclaration,
        ) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn bulk_index_documents(
            &self,
            _index: &str,
            documents: &[Value],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            self.batches.lock().unwrap().push(documents.to_vec());
            if self.fail {
                return Err(SearchIndexError::bulk_index("Mock failure"));
            }

            let accepted = documents.len().saturating_sub(self.rejected_per_batch);
            Ok(BatchOperationSummary::from_results(
                (0..documents.len())
                    .map(|position| BatchOperationResult {
                        position,
                        success: position < accepted,
                        error: (position >= accepted).then(|| "rejected".to_string()),
                    })
                    .collect(),
            ))
        }
    }

    fn setup(
        provider: Arc<MockSearchProvider>,
        capacity: usize,
        fail_fast: bool,
    ) -> (BatchPublisher, Arc<BatchQueue<Record>>) {
        let queue = Arc::new(BatchQueue::new(NonZeroUsize::new(capacity).unwrap()));
        let publisher = BatchPublisher::new(
            provider,
            Arc::clone(&queue),
            PublisherConfig {
                index: "nginx".to_string(),
                fail_fast,
                verbose: true,
            },
        );
        (publisher, queue)
    }

    /// Formatted log output captured for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn count(&self, needle: &str) -> usize {
            let output = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            output.lines().filter(|line| line.contains(needle)).count()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    fn records(count: u64) -> Vec<Record> {
        (0..count).map(|n| Record::new(json!({ "n": n }))).collect()
    }

    fn record(n: u64) -> QueueItem<Record> {
        QueueItem::Record(Record::new(json!({ "n": n })))
    }

    #[tokio::test]
    async fn test_publishes_full_batch_without_sentinels() {
        let provider = Arc::new(MockSearchProvider::new());
        let (publisher, queue) = setup(provider.clone(), 3, false);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        queue.send(record(1)).unwrap();
        queue.send(record(2)).unwrap();
        queue.send(QueueItem::Sentinel).unwrap();

        let handle = tokio::spawn(publisher.run(shutdown_rx));
        timeout(Duration::from_secs(5), queue.await_drained())
            .await
            .unwrap();
        queue.send(QueueItem::EndOfStream).unwrap();

        let totals = timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(
            totals,
            RunningTotals {
                batches: 1,
                attempted: 2,
                succeeded: 2
            }
        );
        assert_eq!(
            *provider.batches.lock().unwrap(),
            vec![vec![json!({"n": 1}), json!({"n": 2})]]
        );
    }

    #[tokio::test]
    async fn test_partial_queue_is_not_drained() {
        let provider = Arc::new(MockSearchProvider::new());
        let (publisher, queue) = setup(provider.clone(), 2, false);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        queue.send(record(1)).unwrap();
        let handle = tokio::spawn(publisher.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(queue.len(), 1);
        assert!(provider.batches.lock().unwrap().is_empty());

        shutdown_tx.send(()).unwrap();
        let totals = handle.await.unwrap().unwrap();
        assert_eq!(totals, RunningTotals::default());
    }

    #[tokio::test]
    async fn test_failed_batch_counts_as_attempted_only() {
        let provider = Arc::new(MockSearchProvider::failing());
        let (mut publisher, _queue) = setup(provider.clone(), 2, false);

        publisher
            .publish(vec![Record::new(json!({"n": 1})), Record::new(json!({"n": 2}))])
            .await
            .unwrap();

        assert_eq!(
            publisher.totals,
            RunningTotals {
                batches: 1,
                attempted: 2,
                succeeded: 0
            }
        );
    }

    #[tokio::test]
    async fn test_failed_batch_is_fatal_with_fail_fast() {
        let provider = Arc::new(MockSearchProvider::failing());
        let (mut publisher, _queue) = setup(provider.clone(), 2, true);

        let result = publisher.publish(vec![Record::new(json!({"n": 1}))]).await;

        assert!(matches!(result, Err(IngestError::BulkWriteError(_))));
    }

    #[tokio::test]
    async fn test_rejected_documents_reduce_success_count() {
        let provider = Arc::new(MockSearchProvider::rejecting(1));
        let (mut publisher, _queue) = setup(provider.clone(), 3, true);

        for _ in 0..2 {
            publisher
                .publish(vec![
                    Record::new(json!({"n": 1})),
                    Record::new(json!({"n": 2})),
                    Record::new(json!({"n": 3})),
                ])
                .await
                .unwrap();
        }

        assert_eq!(
            publisher.totals,
            RunningTotals {
                batches: 2,
                attempted: 6,
                succeeded: 4
            }
        );
    }

    #[tokio::test]
    async fn test_end_of_stream_on_empty_queue_publishes_nothing() {
        let provider = Arc::new(MockSearchProvider::new());
        let (publisher, queue) = setup(provider.clone(), 4, false);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        queue.send(QueueItem::EndOfStream).unwrap();
        let totals = timeout(Duration::from_secs(5), publisher.run(shutdown_rx))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(totals, RunningTotals::default());
        assert!(provider.batches.lock().unwrap().is_empty());
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_progress_logged_after_every_batch() {
        let (logs, _guard) = capture_logs();
        let provider = Arc::new(MockSearchProvider::rejecting(1));
        let (mut publisher, _queue) = setup(provider, 3, false);

        publisher.publish(records(3)).await.unwrap();
        publisher.publish(records(3)).await.unwrap();

        assert_eq!(logs.count("Processed batch: results"), 2);
        assert_eq!(logs.count("results 2/3 documents successfully indexed"), 1);
        assert_eq!(logs.count("results 4/6 documents successfully indexed"), 1);
    }

    #[tokio::test]
    async fn test_skipped_batch_warned_once_per_failure_when_verbose() {
        let (logs, _guard) = capture_logs();
        let provider = Arc::new(MockSearchProvider::failing());
        let (mut publisher, _queue) = setup(provider, 2, false);

        for _ in 0..3 {
            publisher.publish(records(2)).await.unwrap();
        }

        assert_eq!(logs.count("Encountered exception, skipping batch"), 3);
        assert_eq!(logs.count("WARN"), 3);
        assert_eq!(logs.count("Processed batch: results 0/"), 3);
        assert_eq!(logs.count("results 0/6 documents successfully indexed"), 1);
    }

    #[tokio::test]
    async fn test_skipped_batch_logged_at_debug_when_quiet() {
        let (logs, _guard) = capture_logs();
        let provider = Arc::new(MockSearchProvider::failing());
        let (mut publisher, _queue) = setup(provider, 2, false);
        publisher.config.verbose = false;

        for _ in 0..3 {
            publisher.publish(records(2)).await.unwrap();
        }

        assert_eq!(logs.count("Bulk write failed, skipping batch"), 3);
        assert_eq!(logs.count("WARN"), 0);
        assert_eq!(logs.count("Processed batch: results 0/"), 3);
    }
}
