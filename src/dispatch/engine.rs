//! # DispatchEngine: worker pool lifecycle for one batch
//!
//! ## Responsibility
//! Spawn `min(worker_limit, items)` workers, let them drain a closed
//! [`WorkQueue`], wait on the join barrier, then stop every worker and hand
//! back the collected results and report.
//!
//! ## Guarantees
//! - Concurrent: workers run as independent tokio tasks
//! - Isolated: a failing, hanging or panicking item is recorded as a failure
//!   of that item only
//! - Bounded shutdown: workers that do not exit within the grace period
//!   after the barrier are aborted
//! - Observable: each worker logs its activity via tracing
//!
//! ## NOT Responsible For
//! - Per-item domain logic (see: `resolver` module)
//! - Queue mechanics (see: queue.rs)

use super::queue::WorkQueue;
use super::report::{BatchReport, ReportCollector};
use super::{DispatchConfig, TaskFailure, TaskProcessor};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Statistics for one worker of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Worker identifier (`worker-<n>`).
    pub worker_id: String,
    /// Items this worker took from the queue.
    pub items_taken: usize,
    /// Items that succeeded.
    pub items_succeeded: usize,
    /// Items that failed.
    pub items_failed: usize,
}

/// Everything a batch run produces.
///
/// `results` carries no ordering guarantee; pair outputs with inputs by
/// key, never by position.
#[derive(Debug)]
pub struct BatchOutcome<I, O> {
    /// Outputs of successfully processed items.
    pub results: Vec<O>,
    /// Counters and failed items.
    pub report: BatchReport<I>,
    /// One entry per spawned worker.
    pub workers: Vec<WorkerStats>,
}

impl<I, O> BatchOutcome<I, O> {
    fn empty() -> Self {
        Self {
            results: Vec::new(),
            report: BatchReport::empty(),
            workers: Vec::new(),
        }
    }
}

struct WorkerHandle {
    worker_id: String,
    join_handle: JoinHandle<WorkerStats>,
}

/// Runs batches of items through a bounded pool of workers.
///
/// # Example
///
/// ```rust,no_run
/// use tokio_route_pricer::dispatch::{DispatchConfig, DispatchEngine};
/// use std::sync::Arc;
///
/// let engine = DispatchEngine::new(Arc::new(DispatchConfig::with_worker_limit(4)));
/// assert_eq!(engine.config().worker_limit, 4);
/// ```
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    config: Arc<DispatchConfig>,
}

impl DispatchEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: Arc<DispatchConfig>) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Process every item and return once the batch is fully drained.
    ///
    /// An empty `items` returns an empty outcome without spawning workers.
    /// Individual item failures never surface as an error here; they are
    /// counted in the returned report.
    ///
    /// # Panics
    ///
    /// This function never panics. Panics raised by the processor are
    /// caught and recorded as [`TaskFailure::Panicked`].
    pub async fn run<P>(
        &self,
        items: Vec<P::Item>,
        processor: Arc<P>,
    ) -> BatchOutcome<P::Item, P::Output>
    where
        P: TaskProcessor + 'static,
    {
        let total = items.len();
        let pool_size = self.config.pool_size(total);
        if pool_size == 0 {
            tracing::info!("empty batch, no workers spawned");
            return BatchOutcome::empty();
        }

        tracing::info!(items = total, workers = pool_size, "dispatching batch");

        let queue = Arc::new(WorkQueue::closed(items));
        let collector = Arc::new(ReportCollector::new(total));
        let (shutdown_tx, _) = watch::channel(false);
        let item_timeout = self.config.item_timeout();

        let mut handles = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            let worker_id = format!("worker-{i}");
            let join_handle = tokio::spawn(worker_loop(
                worker_id.clone(),
                Arc::clone(&processor),
                Arc::clone(&queue),
                Arc::clone(&collector),
                item_timeout,
                shutdown_tx.subscribe(),
            ));
            handles.push(WorkerHandle {
                worker_id,
                join_handle,
            });
        }

        queue.join().await;
        let _ = shutdown_tx.send(true);
        let workers = stop_workers(handles, self.config.shutdown_grace()).await;

        let (results, report) = collector.finish();
        tracing::info!(
            total = report.total,
            success = report.success,
            fail = report.fail,
            "batch drained"
        );

        BatchOutcome {
            results,
            report,
            workers,
        }
    }
}

/// Pull → process → record → acknowledge, until the queue is exhausted or
/// shutdown is signalled.
async fn worker_loop<P>(
    worker_id: String,
    processor: Arc<P>,
    queue: Arc<WorkQueue<P::Item>>,
    collector: Arc<ReportCollector<P::Item, P::Output>>,
    item_timeout: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> WorkerStats
where
    P: TaskProcessor + 'static,
{
    let mut stats = WorkerStats {
        worker_id: worker_id.clone(),
        ..Default::default()
    };

    loop {
        let item = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                tracing::debug!(worker = %worker_id, "shutdown signal received");
                break;
            }
            next = queue.take() => match next {
                Some(item) => item,
                None => {
                    tracing::debug!(worker = %worker_id, "queue exhausted");
                    break;
                }
            },
        };

        stats.items_taken += 1;
        let key = processor.describe(&item);

        match process_isolated(processor.as_ref(), &item, item_timeout).await {
            Ok(output) => {
                tracing::debug!(worker = %worker_id, item = %key, "item processed");
                collector.record_success(output);
                stats.items_succeeded += 1;
            }
            Err(failure) => {
                tracing::warn!(
                    worker = %worker_id,
                    item = %key,
                    kind = failure.kind(),
                    error = %failure,
                    "item failed"
                );
                collector.record_failure(item, failure);
                stats.items_failed += 1;
            }
        }

        queue.task_done();
    }

    stats
}

/// Run the processor on one item, turning timeouts and panics into failures.
async fn process_isolated<P>(
    processor: &P,
    item: &P::Item,
    item_timeout: Duration,
) -> Result<P::Output, TaskFailure>
where
    P: TaskProcessor,
{
    let guarded = AssertUnwindSafe(processor.process(item)).catch_unwind();
    match tokio::time::timeout(item_timeout, guarded).await {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(TaskFailure::Panicked(panic_message(payload.as_ref()))),
        Err(_) => Err(TaskFailure::Transport(format!(
            "item timed out after {}ms",
            item_timeout.as_millis()
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Wait for every worker to exit, aborting those still running once the
/// grace period has elapsed. The grace period is one deadline for the whole
/// pool, not per worker.
async fn stop_workers(handles: Vec<WorkerHandle>, grace: Duration) -> Vec<WorkerStats> {
    let deadline = Instant::now() + grace;
    let mut all_stats = Vec::with_capacity(handles.len());

    for mut handle in handles {
        let waited = tokio::time::timeout_at(deadline, &mut handle.join_handle).await;
        match waited {
            Ok(Ok(stats)) => {
                tracing::debug!(
                    worker = %stats.worker_id,
                    taken = stats.items_taken,
                    succeeded = stats.items_succeeded,
                    failed = stats.items_failed,
                    "worker finished"
                );
                all_stats.push(stats);
            }
            Ok(Err(e)) => {
                tracing::error!(worker = %handle.worker_id, error = %e, "worker task failed");
                all_stats.push(WorkerStats {
                    worker_id: handle.worker_id,
                    ..Default::default()
                });
            }
            Err(_) => {
                handle.join_handle.abort();
                tracing::warn!(worker = %handle.worker_id, "worker aborted after grace period");
                all_stats.push(WorkerStats {
                    worker_id: handle.worker_id,
                    ..Default::default()
                });
            }
        }
    }

    all_stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Doubles even numbers, fails odd ones, panics on 13, stalls on 99.
    struct ParityProcessor {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ParityProcessor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskProcessor for ParityProcessor {
        type Item = u32;
        type Output = u32;

        fn describe(&self, item: &u32) -> String {
            item.to_string()
        }

        async fn process(&self, item: &u32) -> Result<u32, TaskFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match *item {
                13 => panic!("unlucky item"),
                99 => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(99)
                }
                n if n % 2 == 0 => Ok(n * 2),
                n => Err(TaskFailure::Resolution(format!("{n} is odd"))),
            }
        }
    }

    fn engine(worker_limit: usize) -> DispatchEngine {
        DispatchEngine::new(Arc::new(DispatchConfig {
            worker_limit,
            item_timeout_ms: 200,
            shutdown_grace_ms: 100,
        }))
    }

    #[tokio::test]
    async fn test_run_empty_batch_spawns_no_workers() {
        let processor = Arc::new(ParityProcessor::new());
        let outcome = engine(10).run(Vec::new(), Arc::clone(&processor)).await;
        assert!(outcome.results.is_empty());
        assert!(outcome.workers.is_empty());
        assert_eq!(outcome.report, BatchReport::empty());
        assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_counts_success_and_failure() {
        let processor = Arc::new(ParityProcessor::new());
        let outcome = engine(4).run((0..10).collect(), processor).await;

        assert_eq!(outcome.report.total, 10);
        assert_eq!(outcome.report.success, 5);
        assert_eq!(outcome.report.fail, 5);
        assert!(outcome.report.is_balanced());

        let results: HashSet<u32> = outcome.results.into_iter().collect();
        assert_eq!(results, [0, 4, 8, 12, 16].into_iter().collect());

        let mut failed: Vec<u32> = outcome.report.fail_list().into_iter().copied().collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![1, 3, 5, 7, 9]);
    }

    #[tokio::test]
    async fn test_pool_never_exceeds_item_count() {
        let processor = Arc::new(ParityProcessor::new());
        let outcome = engine(10).run(vec![0, 2, 4], Arc::clone(&processor)).await;
        assert_eq!(outcome.workers.len(), 3);
        assert!(processor.max_in_flight.load(Ordering::SeqCst) <= 3);
        let taken: usize = outcome.workers.iter().map(|w| w.items_taken).sum();
        assert_eq!(taken, 3);
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_worker_limit() {
        let processor = Arc::new(ParityProcessor::new());
        let items: Vec<u32> = (0..20).map(|n| n * 2).collect();
        let outcome = engine(2).run(items, Arc::clone(&processor)).await;
        assert_eq!(outcome.workers.len(), 2);
        assert!(processor.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(outcome.report.success, 20);
    }

    #[tokio::test]
    async fn test_panicking_item_is_isolated() {
        let processor = Arc::new(ParityProcessor::new());
        let outcome = engine(2).run(vec![2, 13, 4], processor).await;
        assert_eq!(outcome.report.success, 2);
        assert_eq!(outcome.report.fail, 1);
        assert_eq!(outcome.report.failures[0].item, 13);
        match &outcome.report.failures[0].failure {
            TaskFailure::Panicked(msg) => assert!(msg.contains("unlucky")),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stalled_item_times_out_as_transport_failure() {
        let processor = Arc::new(ParityProcessor::new());
        let outcome = engine(2).run(vec![99, 2], processor).await;
        assert_eq!(outcome.report.success, 1);
        assert_eq!(outcome.report.fail, 1);
        assert!(matches!(
            outcome.report.failures[0].failure,
            TaskFailure::Transport(ref msg) if msg.contains("timed out")
        ));
    }

    #[tokio::test]
    async fn test_worker_ids_are_sequential() {
        let processor = Arc::new(ParityProcessor::new());
        let outcome = engine(3).run(vec![0, 2, 4, 6, 8], processor).await;
        let ids: Vec<_> = outcome.workers.iter().map(|w| w.worker_id.as_str()).collect();
        assert_eq!(ids, vec!["worker-0", "worker-1", "worker-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_workers_shares_one_grace_deadline() {
        let handles: Vec<WorkerHandle> = (0..4)
            .map(|i| WorkerHandle {
                worker_id: format!("worker-{i}"),
                join_handle: tokio::spawn(async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    WorkerStats::default()
                }),
            })
            .collect();

        let started = Instant::now();
        let stats = stop_workers(handles, Duration::from_millis(100)).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");
        assert_eq!(stats.len(), 4);
        assert!(stats.iter().all(|s| s.items_taken == 0));
        assert_eq!(stats[3].worker_id, "worker-3");
    }

    #[test]
    fn test_panic_message_handles_both_string_kinds() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
