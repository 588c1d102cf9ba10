//! # WorkQueue: closed batch queue with a join barrier
//!
//! ## Responsibility
//! Hold every item of one batch, hand them out one at a time to competing
//! workers, and let the engine wait until every handed-out item has been
//! acknowledged.
//!
//! ## Guarantees
//! - Closed: all items are enqueued at construction; nothing is added later
//! - Blocking: [`WorkQueue::take`] suspends instead of polling and returns
//!   `None` once the input is exhausted
//! - Exactly-once: each item is delivered to exactly one worker
//!
//! ## NOT Responsible For
//! - Running workers (see: engine.rs)
//! - Recording outcomes (see: report.rs)

use tokio::sync::{mpsc, watch, Mutex};

/// Shared queue for one dispatch batch.
///
/// Items live in an unbounded channel whose sender is dropped as soon as the
/// batch is loaded, so a receive on an empty queue returns `None` rather than
/// waiting forever. A watch channel tracks how many items are still
/// unacknowledged; [`WorkQueue::join`] resolves when it reaches zero.
///
/// # Example
///
/// ```rust
/// use tokio_route_pricer::dispatch::queue::WorkQueue;
///
/// # #[tokio::main]
/// # async fn main() {
/// let queue = WorkQueue::closed(vec!["Moscow", "Kazan"]);
/// while let Some(city) = queue.take().await {
///     println!("{city}");
///     queue.task_done();
/// }
/// queue.join().await;
/// assert_eq!(queue.pending(), 0);
/// # }
/// ```
pub struct WorkQueue<T> {
    receiver: Mutex<mpsc::UnboundedReceiver<T>>,
    pending: watch::Sender<usize>,
}

impl<T> WorkQueue<T> {
    /// Load every item and close the input side.
    pub fn closed(items: impl IntoIterator<Item = T>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut count = 0usize;
        for item in items {
            // The receiver is alive in this scope, so the send cannot fail.
            if tx.send(item).is_ok() {
                count += 1;
            }
        }
        drop(tx);

        let (pending, _) = watch::channel(count);
        Self {
            receiver: Mutex::new(rx),
            pending,
        }
    }

    /// Take the next item, or `None` once the batch is exhausted.
    pub async fn take(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    /// Acknowledge one previously taken item.
    pub fn task_done(&self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Number of items not yet acknowledged.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait until every item has been taken and acknowledged.
    pub async fn join(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_closed_queue_yields_items_then_none() {
        let queue = WorkQueue::closed(vec![1, 2, 3]);
        assert_eq!(queue.pending(), 3);
        let mut seen = Vec::new();
        while let Some(n) = queue.take().await {
            seen.push(n);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(queue.take().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_queue_join_returns_immediately() {
        let queue: WorkQueue<u32> = WorkQueue::closed(Vec::new());
        tokio::time::timeout(Duration::from_millis(100), queue.join())
            .await
            .expect("join on empty queue must not block");
    }

    #[tokio::test]
    async fn test_join_waits_for_acknowledgement_not_just_take() {
        let queue = Arc::new(WorkQueue::closed(vec!["a"]));
        assert_eq!(queue.take().await, Some("a"));
        assert!(queue.take().await.is_none());

        let blocked = tokio::time::timeout(Duration::from_millis(50), queue.join()).await;
        assert!(blocked.is_err(), "join must wait for task_done");

        queue.task_done();
        tokio::time::timeout(Duration::from_millis(100), queue.join())
            .await
            .expect("join must resolve after the last ack");
    }

    #[tokio::test]
    async fn test_concurrent_takers_receive_each_item_once() {
        let queue = Arc::new(WorkQueue::closed(0..100u32));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let q = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(n) = q.take().await {
                    got.push(n);
                    q.task_done();
                }
                got
            }));
        }
        let mut all = Vec::new();
        for h in handles {
            all.extend(h.await.unwrap());
        }
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_task_done_saturates_at_zero() {
        let queue: WorkQueue<u8> = WorkQueue::closed(Vec::new());
        queue.task_done();
        assert_eq!(queue.pending(), 0);
    }
}
