//! # Pricing run: routes in, price table out
//!
//! ## Responsibility
//! Drive one complete run: load the city cache, resolve every city named
//! by the routes, persist the cache, price each route for every catalog
//! package and hand the results to the sink.
//! ```text
//! RouteFile → CityResolver → CityStore::persist → CargoPriceResolver → RouteSink
//! ```
//!
//! ## Guarantees
//! - Partial failure is not an error: unresolved cities, skipped routes and
//!   failed prices are all reported in the [`RunSummary`]
//! - The cache is persisted before pricing starts, so resolved cities
//!   survive a failure later in the run
//!
//! ## NOT Responsible For
//! - Argument parsing (see: `main.rs`)

use crate::api::{HttpPricingApi, PricingApi};
use crate::cache::CityCache;
use crate::catalog::Catalog;
use crate::config::{PricerConfig, RequestSettings};
use crate::dispatch::{BatchReport, DispatchEngine};
use crate::model::CargoPriceRequest;
use crate::repository::{
    table_sink, CityStore, JsonCityStore, Route, RouteFile, RouteSink, TableLayout,
};
use crate::resolver::{CargoPriceResolver, CityResolver};
use crate::PricerError;
use std::fmt;
use std::sync::Arc;

/// Statistics of one completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Routes read from the route file.
    pub routes_received: usize,
    /// Cargo price requests built from those routes.
    pub requests_prepared: usize,
    /// Routes not priced because a city could not be resolved.
    pub skipped_routes: Vec<Route>,
    /// Outcome of city resolution.
    pub cities: BatchReport<String>,
    /// Outcome of cargo pricing.
    pub cargo: BatchReport<CargoPriceRequest>,
}

impl RunSummary {
    /// Routes whose cities both resolved and that went on to pricing.
    pub fn routes_sent(&self) -> usize {
        self.routes_received.saturating_sub(self.skipped_routes.len())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "routes received:  {}", self.routes_received)?;
        writeln!(f, "routes sent:      {}", self.routes_sent())?;
        writeln!(f, "routes skipped:   {}", self.skipped_routes.len())?;
        for route in &self.skipped_routes {
            writeln!(f, "  {} -> {}", route.city_from, route.city_to)?;
        }
        writeln!(
            f,
            "cities resolved:  {}/{} ({} failed)",
            self.cities.success, self.cities.total, self.cities.fail
        )?;
        for failed in &self.cities.failures {
            writeln!(f, "  {}: {}", failed.item, failed.failure)?;
        }
        writeln!(f, "requests built:   {}", self.requests_prepared)?;
        write!(
            f,
            "requests priced:  {}/{} ({} failed)",
            self.cargo.success, self.cargo.total, self.cargo.fail
        )?;
        for failed in &self.cargo.failures {
            write!(f, "\n  {}: {}", failed.item.route_label(), failed.failure)?;
        }
        Ok(())
    }
}

/// One configured pricing run.
///
/// ## Example
///
/// ```no_run
/// use tokio_route_pricer::config::PricerConfig;
/// use tokio_route_pricer::repository::{Route, RouteFile};
/// use tokio_route_pricer::run::PricingRun;
///
/// # async fn example() -> Result<(), tokio_route_pricer::PricerError> {
/// let run = PricingRun::from_config(PricerConfig::default(), "token")?;
/// let routes = RouteFile {
///     routes: vec![Route::new("Moscow", "Kazan")],
///     ..RouteFile::default()
/// };
/// let summary = run.execute(&routes).await?;
/// println!("{summary}");
/// # Ok(()) }
/// ```
pub struct PricingRun {
    config: PricerConfig,
    api: Arc<dyn PricingApi>,
    store: Arc<dyn CityStore>,
    sink: Arc<dyn RouteSink>,
}

impl PricingRun {
    /// Run with explicit collaborators.
    pub fn new(
        config: PricerConfig,
        api: Arc<dyn PricingApi>,
        store: Arc<dyn CityStore>,
        sink: Arc<dyn RouteSink>,
    ) -> Self {
        Self {
            config,
            api,
            store,
            sink,
        }
    }

    /// Run against the configured HTTP endpoints and files. The table is a
    /// workbook when `paths.results` ends in `.xlsx`, JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PricerError::Client`] if `bearer_token` is blank.
    pub fn from_config(config: PricerConfig, bearer_token: &str) -> Result<Self, PricerError> {
        let token = bearer_token.trim();
        if token.is_empty() {
            return Err(PricerError::Client("bearer token is empty".into()));
        }

        let api = HttpPricingApi::new(&config.api).with_bearer_token(token);
        let store = JsonCityStore::new(config.paths.city_cache.clone());
        let sink = table_sink(&config.paths.results);
        Ok(Self::new(config, Arc::new(api), Arc::new(store), sink))
    }

    /// The configuration this run uses.
    pub fn config(&self) -> &PricerConfig {
        &self.config
    }

    /// Execute the run for `routes`.
    ///
    /// # Errors
    ///
    /// Only storage failures abort the run: [`PricerError::Io`],
    /// [`PricerError::Serialization`] or [`PricerError::Spreadsheet`] from
    /// the city store or the sink.
    pub async fn execute(&self, routes: &RouteFile) -> Result<RunSummary, PricerError> {
        let settings = routes.settings(&self.config.request);
        let engine = DispatchEngine::new(Arc::new(self.config.dispatch.clone()));
        tracing::info!(
            routes = routes.routes.len(),
            workers = engine.config().worker_limit,
            caption = %settings.caption(),
            "pricing run started"
        );

        let cache = CityCache::from_records(self.store.load()?);
        let city_resolver =
            CityResolver::new(Arc::clone(&self.api), cache.clone(), engine.clone());
        let (_, city_report) = city_resolver.resolve_all(routes.unique_cities()).await;
        self.store.persist(&cache.snapshot())?;

        let (requests, skipped_routes) =
            build_requests(&routes.routes, &cache, &settings, &self.config.catalog);
        for route in &skipped_routes {
            tracing::warn!(
                city_from = %route.city_from,
                city_to = %route.city_to,
                "route skipped, city unresolved"
            );
        }
        let requests_prepared = requests.len();

        let cargo_resolver = CargoPriceResolver::new(Arc::clone(&self.api), engine);
        let (results, cargo_report) = cargo_resolver.price_all(requests).await;

        let layout = TableLayout {
            caption: settings.caption(),
            weights: self.config.catalog.weights(),
            routes: routes.routes.clone(),
        };
        self.sink.write(&results, &layout)?;

        let summary = RunSummary {
            routes_received: routes.routes.len(),
            requests_prepared,
            skipped_routes,
            cities: city_report,
            cargo: cargo_report,
        };
        tracing::info!(
            routes_received = summary.routes_received,
            routes_sent = summary.routes_sent(),
            requests_prepared = summary.requests_prepared,
            routes_skipped = summary.skipped_routes.len(),
            cities_failed = summary.cities.fail,
            prices_failed = summary.cargo.fail,
            "pricing run finished"
        );
        Ok(summary)
    }
}

/// One request per route and catalog entry.
///
/// Routes with a city missing from `cache` are returned as skipped instead.
/// Additional services are attached only when `settings` enables them.
pub fn build_requests(
    routes: &[Route],
    cache: &CityCache,
    settings: &RequestSettings,
    catalog: &Catalog,
) -> (Vec<CargoPriceRequest>, Vec<Route>) {
    let mut requests = Vec::with_capacity(routes.len() * catalog.entries.len());
    let mut skipped = Vec::new();

    for route in routes {
        let (Some(sender), Some(receiver)) =
            (cache.get(&route.city_from), cache.get(&route.city_to))
        else {
            skipped.push(route.clone());
            continue;
        };

        for entry in &catalog.entries {
            let services = if settings.additional_services {
                entry.additional_services.clone()
            } else {
                Vec::new()
            };
            requests.push(
                CargoPriceRequest::new(&sender, &receiver, vec![entry.package])
                    .with_mode(&settings.mode)
                    .with_payer_type(&settings.payer_type)
                    .with_currency_mark(&settings.currency_mark)
                    .with_tariff(&settings.cargo_type_descr, &settings.tariff_description)
                    .with_additional_services(services),
            );
        }
    }

    (requests, skipped)
}
