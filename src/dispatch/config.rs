//! # DispatchConfig: worker pool configuration
//!
//! ## Responsibility
//! Define the knobs of one dispatch run: how many workers may run at once,
//! how long a single item may take, and how long the engine waits for
//! workers to exit after the batch has drained.
//!
//! ## Guarantees
//! - Defaulted: every field has a sensible default
//! - Serializable: round-trips through serde (TOML ↔ Rust)
//!
//! ## NOT Responsible For
//! - Validation across the whole run configuration (see: `config::validation`)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the dispatch engine.
///
/// # Fields
///
/// * `worker_limit`: Upper bound on concurrent workers (default: 10)
/// * `item_timeout_ms`: Budget for one item, all remote calls included (default: 60000)
/// * `shutdown_grace_ms`: Wait for the workers to exit before aborting them (default: 1000)
///
/// # Example
///
/// ```rust
/// use tokio_route_pricer::dispatch::DispatchConfig;
/// let config = DispatchConfig::default();
/// assert_eq!(config.worker_limit, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on concurrently running workers.
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,

    /// Milliseconds one item may take before it is failed as a timeout.
    #[serde(default = "default_item_timeout_ms")]
    pub item_timeout_ms: u64,

    /// Milliseconds to wait, in total, for the workers after shutdown is signalled.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_limit: default_worker_limit(),
            item_timeout_ms: default_item_timeout_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl DispatchConfig {
    /// Config with the given worker limit and default timeouts.
    pub fn with_worker_limit(worker_limit: usize) -> Self {
        Self {
            worker_limit,
            ..Self::default()
        }
    }

    /// Number of workers to spawn for a batch of `item_count` items.
    ///
    /// Clamped to `min(worker_limit, item_count)`, so an empty batch
    /// spawns nothing.
    pub fn pool_size(&self, item_count: usize) -> usize {
        self.worker_limit.min(item_count)
    }

    /// Per-item timeout as a [`Duration`].
    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Default worker limit: 10.
fn default_worker_limit() -> usize {
    10
}

/// Default per-item timeout: 60 seconds.
fn default_item_timeout_ms() -> u64 {
    60_000
}

/// Default shutdown grace: 1 second.
fn default_shutdown_grace_ms() -> u64 {
    1_000
}
