//! # City resolver: city names → city records
//!
//! ## Responsibility
//! Resolve raw city names to [`CityRecord`]s through the autocomplete
//! endpoint, consulting and filling the shared [`CityCache`].
//!
//! ## Guarantees
//! - Cache first: a cached name never triggers a network call
//! - Exact match: only a candidate whose name equals the query
//!   (case-sensitive) is accepted; the first such candidate with a uuid wins
//! - Idempotent: resolving a name twice yields the same record
//!
//! ## NOT Responsible For
//! - Persisting the cache (see: `repository::cities`)

use crate::api::PricingApi;
use crate::cache::CityCache;
use crate::dispatch::{BatchReport, DispatchEngine, TaskFailure, TaskProcessor};
use crate::model::CityRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-item logic of the city lookup.
pub struct CityLookupProcessor {
    api: Arc<dyn PricingApi>,
    cache: CityCache,
}

impl CityLookupProcessor {
    /// Processor using `api` for lookups and `cache` for cost avoidance.
    pub fn new(api: Arc<dyn PricingApi>, cache: CityCache) -> Self {
        Self { api, cache }
    }

    /// Resolve one name, hitting the network only on a cache miss.
    ///
    /// # Errors
    ///
    /// - [`TaskFailure::Lookup`] if no candidate with exactly this name
    ///   carries a city uuid
    /// - [`TaskFailure::Transport`] if the autocomplete call fails
    pub async fn resolve(&self, city_name: &str) -> Result<CityRecord, TaskFailure> {
        if let Some(record) = self.cache.get(city_name) {
            tracing::debug!(city = city_name, "cache hit");
            return Ok(record);
        }

        let response = self.api.autocomplete(city_name).await?;
        let record = response
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|candidate| candidate.name.as_deref() == Some(city_name))
            .find_map(|candidate| {
                Some(CityRecord {
                    city_uid: candidate.uuid?,
                    name: city_name.to_string(),
                    full_name: candidate.full_name.unwrap_or_default(),
                })
            })
            .ok_or_else(|| TaskFailure::Lookup {
                name: city_name.to_string(),
            })?;

        Ok(self.cache.insert(record))
    }
}

#[async_trait]
impl TaskProcessor for CityLookupProcessor {
    type Item = String;
    type Output = CityRecord;

    fn describe(&self, item: &String) -> String {
        item.clone()
    }

    async fn process(&self, item: &String) -> Result<CityRecord, TaskFailure> {
        self.resolve(item).await
    }
}

/// Resolves batches of city names over a bounded worker pool.
///
/// ## Example
///
/// ```no_run
/// use tokio_route_pricer::api::HttpPricingApi;
/// use tokio_route_pricer::cache::CityCache;
/// use tokio_route_pricer::config::ApiConfig;
/// use tokio_route_pricer::dispatch::{DispatchConfig, DispatchEngine};
/// use tokio_route_pricer::resolver::CityResolver;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let api = Arc::new(HttpPricingApi::new(&ApiConfig::default()));
/// let engine = DispatchEngine::new(Arc::new(DispatchConfig::default()));
/// let resolver = CityResolver::new(api, CityCache::new(), engine);
/// let (cities, report) = resolver.resolve_all(vec!["Moscow".into()]).await;
/// println!("{} resolved, {} failed", cities.len(), report.fail);
/// # }
/// ```
pub struct CityResolver {
    processor: Arc<CityLookupProcessor>,
    engine: DispatchEngine,
}

impl CityResolver {
    /// Resolver writing into `cache`.
    pub fn new(api: Arc<dyn PricingApi>, cache: CityCache, engine: DispatchEngine) -> Self {
        Self {
            processor: Arc::new(CityLookupProcessor::new(api, cache)),
            engine,
        }
    }

    /// The cache this resolver reads and fills.
    pub fn cache(&self) -> &CityCache {
        &self.processor.cache
    }

    /// Resolve every name; results are keyed by city name.
    ///
    /// Never fails as a whole: unresolved names end up in the report's
    /// failure list.
    pub async fn resolve_all(
        &self,
        city_names: Vec<String>,
    ) -> (HashMap<String, CityRecord>, BatchReport<String>) {
        let outcome = self
            .engine
            .run(city_names, Arc::clone(&self.processor))
            .await;

        let cities = outcome
            .results
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();

        tracing::info!(
            total = outcome.report.total,
            success = outcome.report.success,
            fail = outcome.report.fail,
            "city resolution finished"
        );

        (cities, outcome.report)
    }
}
