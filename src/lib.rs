//! # tokio-route-pricer
//!
//! Batch pricing of courier delivery routes over Tokio.
//!
//! ## Architecture
//!
//! Two resolvers share one generic, bounded worker-pool engine:
//! ```text
//! city names ──► CityResolver ──► CityCache ─┐
//!                                            ▼
//! routes × catalog ──► CargoPriceRequest ──► CargoPriceResolver ──► price table
//!                                            (estimate → price)
//! ```
//!
//! - [`dispatch`]: the engine (queue, workers, per-batch report)
//! - [`resolver`]: city lookup and cargo pricing on top of the engine
//! - [`api`]: the remote pricing API (trait + `reqwest` client)
//! - [`run`]: the end-to-end pipeline driven by the `route-pricer` binary

// ── Lint policy ───────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use std::path::Path;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod model;
pub mod repository;
pub mod resolver;
pub mod run;

// Re-exports for convenience
pub use api::{HttpPricingApi, PricingApi};
pub use cache::CityCache;
pub use config::PricerConfig;
pub use dispatch::{BatchReport, DispatchConfig, DispatchEngine, TaskFailure, TaskProcessor};
pub use resolver::{CargoPriceResolver, CityResolver};
pub use run::{PricingRun, RunSummary};

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"`: structured JSON output for log aggregators
/// - anything else (including unset): human-readable pretty output
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`PricerError::Client`] if the global subscriber has already
/// been set (e.g. by a previous call or a test harness).
///
/// # Example
///
/// ```no_run
/// # use tokio_route_pricer::{init_tracing, PricerError};
/// # fn example() -> Result<(), PricerError> {
/// init_tracing()?;
/// # Ok(()) }
/// ```
pub fn init_tracing() -> Result<(), PricerError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|e| PricerError::Client(format!("tracing init failed: {e}")))
}

/// Top-level errors: the ones that abort a run.
///
/// Per-item failures never show up here; they are [`TaskFailure`]s counted
/// in a [`BatchReport`].
#[derive(Error, Debug)]
pub enum PricerError {
    /// The run configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// A file could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The spreadsheet output could not be produced.
    #[error("spreadsheet error on {path}: {source}")]
    Spreadsheet {
        /// The workbook being written.
        path: String,
        /// Underlying writer error.
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// The route, params or token file is malformed.
    #[error("invalid input: {0}")]
    Input(String),

    /// The client could not be set up (credentials, logging).
    #[error("client setup failed: {0}")]
    Client(String),
}

impl PricerError {
    /// [`PricerError::Io`] for `path`.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
