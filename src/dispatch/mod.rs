//! # Dispatch: bounded worker pool over a closed batch
//!
//! ## Responsibility
//! Run one finite batch of work items through a fixed-size pool of Tokio
//! workers. Every worker pulls an item from a shared queue, hands it to a
//! [`TaskProcessor`], records the outcome and acknowledges the item. The
//! batch ends when every item has been taken *and* acknowledged.
//!
//! ## Architecture
//!
//! ```text
//! Vec<Item> ──► WorkQueue (closed, pending counter)
//!                    │
//!                    ├──► worker-0 ──► TaskProcessor::process ──┐
//!                    ├──► worker-1 ──► TaskProcessor::process ──┤
//!                    ├──► worker-N ──► TaskProcessor::process ──┤
//!                    │                                          ▼
//!               join barrier ◄──────────────── ReportCollector (mutex)
//!                    │
//!               shutdown signal ──► BatchOutcome { results, report, workers }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: pool size, per-item timeout, shutdown grace
//! - [`queue`]: closed input channel plus a join barrier
//! - [`report`]: BatchReport and the mutex-guarded collector
//! - [`engine`]: spawn, drain, shut down
//!
//! ## Guarantees
//!
//! - **Failure isolation**: an error, timeout or panic in one item never
//!   stops the batch or another worker
//! - **Exact accounting**: `success + fail == total` once `run` returns
//! - **No idle workers**: the pool never exceeds the number of items
//! - **No busy polling**: idle workers block on the queue receive
//!
//! ## NOT Responsible For
//!
//! - What an item *means* (see: `resolver` module)
//! - HTTP transport (see: `api` module)

pub mod config;
pub mod engine;
pub mod queue;
pub mod report;

use async_trait::async_trait;
use thiserror::Error;

pub use config::DispatchConfig;
pub use engine::{BatchOutcome, DispatchEngine, WorkerStats};
pub use report::{BatchReport, FailedItem};

/// Why a single work item failed.
///
/// Every variant is recoverable at batch level: the engine records it
/// against the item and moves on.
///
/// # Panics
///
/// No methods on this type panic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskFailure {
    /// The autocomplete endpoint returned no entry with exactly this name.
    #[error("no city named {name:?} in autocomplete response")]
    Lookup {
        /// The city name that was queried.
        name: String,
    },

    /// No tariff group/option matched the request's descriptors.
    #[error("tariff resolution failed: {0}")]
    Resolution(String),

    /// The price-calculation response carried no usable price payload.
    #[error("price payload missing: {0}")]
    Price(String),

    /// Network error, timeout, non-2xx status or undecodable body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The processor panicked while handling the item.
    #[error("processor panicked: {0}")]
    Panicked(String),
}

impl TaskFailure {
    /// Short, stable label for the failure class, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lookup { .. } => "lookup",
            Self::Resolution(_) => "resolution",
            Self::Price(_) => "price",
            Self::Transport(_) => "transport",
            Self::Panicked(_) => "panicked",
        }
    }
}

/// Per-domain logic executed by a worker for one item.
///
/// The engine is generic over this trait; the city resolver and the cargo
/// price resolver are its two implementations. Processors must be
/// `Send + Sync` because one instance is shared by every worker.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    /// One unit of dispatchable work. Immutable once enqueued.
    type Item: Send + Sync + 'static;

    /// The value produced for a successfully processed item.
    type Output: Send + 'static;

    /// Human-readable key of an item, used in log fields.
    fn describe(&self, item: &Self::Item) -> String;

    /// Process one item, performing whatever remote calls it needs.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskFailure`] describing why this item could not be
    /// completed. The error is recorded against the item only.
    async fn process(&self, item: &Self::Item) -> Result<Self::Output, TaskFailure>;
}
