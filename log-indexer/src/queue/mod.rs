//! Bounded hand-off queue between the record reader and the batch publisher.
//!
//! The queue has a fixed capacity that doubles as the batch size. The reader
//! fills it, the publisher drains it once it is full, and the reader waits on
//! the completion barrier ([`BatchQueue::await_drained`]) before refilling it.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::warn;

use crate::errors::QueueError;

/// An item travelling through the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueItem<T> {
    /// A decoded record to publish.
    Record(T),
    /// Padding that completes a short final batch. Never published.
    Sentinel,
    /// The source is exhausted; the publisher stops after draining it.
    EndOfStream,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<QueueItem<T>>,
    /// Items sent but not yet marked processed.
    outstanding: usize,
    /// An `EndOfStream` is waiting in `items`.
    end_of_stream: bool,
}

/// Fixed-capacity FIFO shared by one producer and one consumer.
///
/// All operations are non-blocking except the two waits, which never hold the
/// internal lock while suspended.
#[derive(Debug)]
pub struct BatchQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    /// Signalled when the queue becomes full or receives `EndOfStream`.
    ready: Notify,
    /// Signalled when the outstanding count drops to zero.
    drained: Notify,
}

impl<T> BatchQueue<T> {
    /// Create an empty queue.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.get()),
                outstanding: 0,
                end_of_stream: false,
            }),
            ready: Notify::new(),
            drained: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        // State is only mutated in short non-panicking sections
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue an item without waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the item was enqueued
    /// * `Err(QueueError::QueueFull)` - If the queue is at capacity
    pub fn send(&self, item: QueueItem<T>) -> Result<(), QueueError> {
        let ready = {
            let mut state = self.lock();
            if state.items.len() >= self.capacity {
                return Err(QueueError::QueueFull {
                    capacity: self.capacity,
                });
            }
            if matches!(item, QueueItem::EndOfStream) {
                state.end_of_stream = true;
            }
            state.items.push_back(item);
            state.outstanding += 1;
            state.items.len() == self.capacity || state.end_of_stream
        };

        if ready {
            self.ready.notify_one();
        }
        Ok(())
    }

    /// Dequeue the oldest item without waiting.
    pub fn try_receive(&self) -> Option<QueueItem<T>> {
        let mut state = self.lock();
        let item = state.items.pop_front()?;
        if matches!(item, QueueItem::EndOfStream) {
            state.end_of_stream = false;
        }
        Some(item)
    }

    pub fn is_full(&self) -> bool {
        self.lock().items.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items sent but not yet marked processed.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Mark one dequeued item as processed.
    ///
    /// Called once per item received. Wakes [`BatchQueue::await_drained`]
    /// callers when nothing is left outstanding.
    pub fn mark_processed(&self) {
        let drained = {
            let mut state = self.lock();
            if state.outstanding == 0 {
                warn!("mark_processed called with no outstanding items");
                return;
            }
            state.outstanding -= 1;
            state.outstanding == 0
        };

        if drained {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every item sent so far has been marked processed.
    pub async fn await_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent notify_waiters is not missed
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Wait until the queue is full or holds an `EndOfStream`.
    ///
    /// Intended for the single consumer. A wake-up that arrives while the
    /// consumer is busy is kept as a permit, so none is lost.
    pub async fn wait_ready(&self) {
        loop {
            if self.is_ready() {
                return;
            }
            self.ready.notified().await;
        }
    }

    fn is_ready(&self) -> bool {
        let state = self.lock();
        state.items.len() >= self.capacity || state.end_of_stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn queue(capacity: usize) -> BatchQueue<u32> {
        BatchQueue::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_send_rejects_when_full() {
        let queue = queue(2);
        queue.send(QueueItem::Record(1)).unwrap();
        queue.send(QueueItem::Sentinel).unwrap();

        assert!(queue.is_full());
        assert_eq!(
            queue.send(QueueItem::Record(3)),
            Err(QueueError::QueueFull { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_fifo_order() {
        let queue = queue(3);
        queue.send(QueueItem::Record(1)).unwrap();
        queue.send(QueueItem::Record(2)).unwrap();
        queue.send(QueueItem::Sentinel).unwrap();

        assert_eq!(queue.try_receive(), Some(QueueItem::Record(1)));
        assert_eq!(queue.try_receive(), Some(QueueItem::Record(2)));
        assert_eq!(queue.try_receive(), Some(QueueItem::Sentinel));
        assert_eq!(queue.try_receive(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_outstanding_tracks_sent_minus_processed() {
        let queue = queue(3);
        queue.send(QueueItem::Record(1)).unwrap();
        queue.send(QueueItem::Record(2)).unwrap();
        assert_eq!(queue.outstanding(), 2);

        queue.try_receive();
        assert_eq!(queue.outstanding(), 2);

        queue.mark_processed();
        assert_eq!(queue.outstanding(), 1);

        // Extra calls do not underflow
        queue.mark_processed();
        queue.mark_processed();
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_await_drained_returns_immediately_when_idle() {
        let queue = queue(1);
        timeout(Duration::from_secs(1), queue.await_drained())
            .await
            .expect("await_drained should not block on an idle queue");
    }

    #[tokio::test]
    async fn test_await_drained_waits_for_consumer() {
        let queue = Arc::new(queue(2));
        queue.send(QueueItem::Record(1)).unwrap();
        queue.send(QueueItem::Record(2)).unwrap();

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                while let Some(_item) = queue.try_receive() {
                    queue.mark_processed();
                }
            })
        };

        timeout(Duration::from_secs(5), queue.await_drained())
            .await
            .expect("await_drained should resolve once items are processed");
        assert_eq!(queue.outstanding(), 0);
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_received_but_unprocessed_items_block_drain() {
        let queue = queue(1);
        queue.send(QueueItem::Record(1)).unwrap();
        queue.try_receive();

        let result = timeout(Duration::from_millis(50), queue.await_drained()).await;
        assert!(result.is_err());

        queue.mark_processed();
        timeout(Duration::from_secs(1), queue.await_drained())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_ready_on_full_queue() {
        let queue = Arc::new(queue(2));

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.wait_ready().await })
        };

        queue.send(QueueItem::Record(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        queue.send(QueueItem::Sentinel).unwrap();
        timeout(Duration::from_secs(5), waiter)
            .await
            .expect("wait_ready should resolve once full")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_ready_on_end_of_stream() {
        let queue = queue(4);
        queue.send(QueueItem::EndOfStream).unwrap();
        assert!(!queue.is_full());

        timeout(Duration::from_secs(1), queue.wait_ready())
            .await
            .expect("wait_ready should resolve on end of stream");

        assert_eq!(queue.try_receive(), Some(QueueItem::EndOfStream));
        let result = timeout(Duration::from_millis(50), queue.wait_ready()).await;
        assert!(result.is_err(), "end of stream should not stay ready once received");
    }
}
