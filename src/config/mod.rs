//! # Run configuration
//!
//! ## Responsibility
//! Define, parse and validate the TOML configuration of a pricing run:
//! which endpoints to call, how wide the worker pool is, which tariff to
//! price, where the city cache and results live, and which package sizes
//! to price.
//! ```text
//! route-pricer --config pricer.toml --routes routes.toml --token-file token.txt
//! ```
//!
//! ## Guarantees
//! - Deterministic: same TOML input always produces the same `PricerConfig`
//! - Defaulted: every section and field may be omitted
//! - Validated: all semantic constraints are checked before a config is accepted
//!
//! ## NOT Responsible For
//! - Reading the route list (that belongs to `repository::routes`)
//! - Running the batch (that belongs to `run`)

pub mod loader;
pub mod validation;

use crate::catalog::Catalog;
use crate::dispatch::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use loader::{load, load_from_file, load_from_str, ConfigOverrides};
pub use validation::ConfigError;

// ── Default value functions ──────────────────────────────────────────────

/// Default autocomplete endpoint.
fn default_autocomplete_url() -> String {
    "https://www.cdek.ru/api-lkfl/cities/autocomplete".to_string()
}

/// Default tariff-estimate endpoint.
fn default_estimate_url() -> String {
    "https://www.cdek.ru/api-lkfl/estimateV2".to_string()
}

/// Default price-calculation endpoint.
fn default_price_url() -> String {
    "https://www.cdek.ru/api-lkfl/getTariffInfo".to_string()
}

/// Default per-request timeout: 30 seconds.
fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_payer_type() -> String {
    "sender".to_string()
}

fn default_currency_mark() -> String {
    "RUB".to_string()
}

fn default_mode() -> String {
    "HOME-HOME".to_string()
}

fn default_cargo_type_descr() -> String {
    "Экспресс-доставка ко времени".to_string()
}

fn default_tariff_description() -> String {
    "16:00".to_string()
}

fn default_true() -> bool {
    true
}

/// Default city cache file: `data_input/cities.json`.
fn default_city_cache() -> PathBuf {
    PathBuf::from("data_input/cities.json")
}

/// Default results file: `data_output/prices_cdek.xlsx`.
fn default_results() -> PathBuf {
    PathBuf::from("data_output/prices_cdek.xlsx")
}

// ── Sections ─────────────────────────────────────────────────────────────

/// Remote endpoints and transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// City autocomplete endpoint (GET).
    #[serde(default = "default_autocomplete_url")]
    pub autocomplete_url: String,
    /// Tariff-estimate endpoint (POST).
    #[serde(default = "default_estimate_url")]
    pub estimate_url: String,
    /// Price-calculation endpoint (POST, bearer-authenticated).
    #[serde(default = "default_price_url")]
    pub price_url: String,
    /// Timeout of a single HTTP call in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            autocomplete_url: default_autocomplete_url(),
            estimate_url: default_estimate_url(),
            price_url: default_price_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ApiConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// What to price: payer, currency and the tariff to select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Who pays: `sender` or `receiver`.
    #[serde(default = "default_payer_type")]
    pub payer_type: String,
    /// Currency code.
    #[serde(default = "default_currency_mark")]
    pub currency_mark: String,
    /// Delivery mode, e.g. `HOME-HOME`.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Description of the tariff group.
    #[serde(default = "default_cargo_type_descr")]
    pub cargo_type_descr: String,
    /// Short description of the tariff inside the group.
    #[serde(default = "default_tariff_description")]
    pub tariff_description: String,
    /// Price the catalog's additional services along with delivery.
    #[serde(default = "default_true")]
    pub additional_services: bool,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            payer_type: default_payer_type(),
            currency_mark: default_currency_mark(),
            mode: default_mode(),
            cargo_type_descr: default_cargo_type_descr(),
            tariff_description: default_tariff_description(),
            additional_services: true,
        }
    }
}

impl RequestSettings {
    /// `"<cargo type>, <mode>, <tariff>"`, the caption of the result table.
    pub fn caption(&self) -> String {
        format!(
            "{}, {}, {}",
            self.cargo_type_descr, self.mode, self.tariff_description
        )
    }
}

/// Files owned by the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON file holding the city cache between runs.
    #[serde(default = "default_city_cache")]
    pub city_cache: PathBuf,
    /// File the priced table is written to: a spreadsheet for `.xlsx`,
    /// JSON for any other extension.
    #[serde(default = "default_results")]
    pub results: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            city_cache: default_city_cache(),
            results: default_results(),
        }
    }
}

/// Top-level run configuration.
///
/// # Example
///
/// ```rust
/// use tokio_route_pricer::config::{load_from_str, PricerConfig};
///
/// let config = load_from_str("[dispatch]\nworker_limit = 4\n", "inline").unwrap();
/// assert_eq!(config.dispatch.worker_limit, 4);
/// assert_eq!(config.request.mode, PricerConfig::default().request.mode);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricerConfig {
    /// Remote endpoints.
    #[serde(default)]
    pub api: ApiConfig,
    /// Worker pool.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Tariff selection.
    #[serde(default)]
    pub request: RequestSettings,
    /// Files.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Package sizes.
    #[serde(default)]
    pub catalog: Catalog,
}
