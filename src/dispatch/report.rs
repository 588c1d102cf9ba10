//! # BatchReport: per-batch success/failure accounting
//!
//! ## Responsibility
//! Count successes and failures of one batch and keep every failed item,
//! unmodified, together with the reason it failed.
//!
//! ## Guarantees
//! - Each item is counted exactly once, under a single mutex
//! - `success + fail == total` once every item has been recorded
//! - Failed items are stored as submitted so they can be retried or reported
//!
//! ## NOT Responsible For
//! - Deciding what counts as a failure (see: `TaskProcessor`)

use super::TaskFailure;
use parking_lot::Mutex;
use serde::Serialize;

/// One failed item and the reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedItem<I> {
    /// The item exactly as it was submitted.
    pub item: I,
    /// What went wrong.
    #[serde(serialize_with = "serialize_failure")]
    pub failure: TaskFailure,
}

/// Aggregate outcome counters for one batch.
///
/// # Example
///
/// ```rust
/// use tokio_route_pricer::dispatch::BatchReport;
/// let report: BatchReport<String> = BatchReport::empty();
/// assert_eq!(report.total, 0);
/// assert!(report.is_balanced());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<I> {
    /// Items submitted to the batch.
    pub total: usize,
    /// Items processed successfully.
    pub success: usize,
    /// Items that failed.
    pub fail: usize,
    /// Every failed item, in the order failures were recorded.
    pub failures: Vec<FailedItem<I>>,
}

impl<I> BatchReport<I> {
    /// Zeroed report for an empty batch.
    pub fn empty() -> Self {
        Self::with_total(0)
    }

    fn with_total(total: usize) -> Self {
        Self {
            total,
            success: 0,
            fail: 0,
            failures: Vec::new(),
        }
    }

    /// The failed items, without their reasons.
    pub fn fail_list(&self) -> Vec<&I> {
        self.failures.iter().map(|f| &f.item).collect()
    }

    /// `true` when every submitted item has been counted exactly once.
    pub fn is_balanced(&self) -> bool {
        self.success + self.fail == self.total
    }
}

fn serialize_failure<S: serde::Serializer>(
    failure: &TaskFailure,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(failure)
}

struct CollectorState<I, O> {
    results: Vec<O>,
    report: BatchReport<I>,
}

/// Mutex-guarded aggregation point shared by every worker of a batch.
///
/// The lock is a synchronous `parking_lot::Mutex` and is never held across
/// an await point.
pub(crate) struct ReportCollector<I, O> {
    state: Mutex<CollectorState<I, O>>,
}

impl<I, O> ReportCollector<I, O> {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            state: Mutex::new(CollectorState {
                results: Vec::with_capacity(total),
                report: BatchReport::with_total(total),
            }),
        }
    }

    pub(crate) fn record_success(&self, output: O) {
        let mut state = self.state.lock();
        state.results.push(output);
        state.report.success += 1;
    }

    pub(crate) fn record_failure(&self, item: I, failure: TaskFailure) {
        let mut state = self.state.lock();
        state.report.fail += 1;
        state.report.failures.push(FailedItem { item, failure });
    }

    /// Take the accumulated results and report, leaving the collector empty.
    pub(crate) fn finish(&self) -> (Vec<O>, BatchReport<I>) {
        let mut state = self.state.lock();
        let total = state.report.total;
        let results = std::mem::take(&mut state.results);
        let report = std::mem::replace(&mut state.report, BatchReport::with_total(total));
        (results, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_report_is_balanced() {
        let report: BatchReport<u32> = BatchReport::empty();
        assert_eq!((report.total, report.success, report.fail), (0, 0, 0));
        assert!(report.is_balanced());
        assert!(report.fail_list().is_empty());
    }

    #[test]
    fn test_collector_counts_success_and_failure() {
        let collector: ReportCollector<&str, u32> = ReportCollector::new(3);
        collector.record_success(1);
        collector.record_success(2);
        collector.record_failure("bad", TaskFailure::Price("empty".into()));

        let (results, report) = collector.finish();
        assert_eq!(results, vec![1, 2]);
        assert_eq!(report.total, 3);
        assert_eq!(report.success, 2);
        assert_eq!(report.fail, 1);
        assert_eq!(report.fail_list(), vec![&"bad"]);
        assert_eq!(report.failures[0].failure.kind(), "price");
        assert!(report.is_balanced());
    }

    #[test]
    fn test_collector_concurrent_recording_is_exact() {
        let collector: Arc<ReportCollector<usize, usize>> = Arc::new(ReportCollector::new(800));
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let c = Arc::clone(&collector);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        if i % 4 == 0 {
                            c.record_failure(t * 100 + i, TaskFailure::Transport("x".into()));
                        } else {
                            c.record_success(t * 100 + i);
                        }
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        let (results, report) = collector.finish();
        assert_eq!(results.len(), 600);
        assert_eq!(report.success, 600);
        assert_eq!(report.fail, 200);
        assert!(report.is_balanced());
    }

    #[test]
    fn test_failed_item_serializes_failure_as_message() {
        let failed = FailedItem {
            item: "Unknownville".to_string(),
            failure: TaskFailure::Lookup {
                name: "Unknownville".to_string(),
            },
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["item"], "Unknownville");
        assert!(json["failure"]
            .as_str()
            .unwrap()
            .contains("no city named"));
    }
}
