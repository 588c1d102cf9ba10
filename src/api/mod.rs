//! Remote pricing API abstraction and its HTTP implementation
//!
//! Provides the [`PricingApi`] trait, one method per remote endpoint:
//! - autocomplete: city name → candidate cities
//! - tariff estimate: route + packages → tariff groups with service ids
//! - price calculation: route + packages + service id → prices
//!
//! [`HttpPricingApi`] talks to the real endpoints over `reqwest`. Every
//! failure of a call (connect error, timeout, non-2xx, undecodable body)
//! surfaces as [`TaskFailure::Transport`], which the dispatch engine
//! records against the item being processed.

pub mod client;
pub mod wire;

use crate::dispatch::TaskFailure;
use async_trait::async_trait;

pub use client::HttpPricingApi;
pub use wire::{
    AutocompleteResponse, PriceCalculationBody, PriceResponse, ServiceIdRequest,
    TariffEstimateResponse,
};

/// The three remote calls both resolvers are built on.
///
/// Implementations must be thread-safe (Send + Sync): one instance is shared
/// by every worker of a batch. The trait is object-safe to allow
/// `Arc<dyn PricingApi>`.
#[async_trait]
pub trait PricingApi: Send + Sync {
    /// Look up candidate cities for a raw city name.
    async fn autocomplete(&self, city_name: &str) -> Result<AutocompleteResponse, TaskFailure>;

    /// List the tariff groups available for a route and its packages.
    async fn estimate_tariffs(
        &self,
        request: &ServiceIdRequest<'_>,
    ) -> Result<TariffEstimateResponse, TaskFailure>;

    /// Price a route for a resolved tariff.
    async fn calculate_price(
        &self,
        body: &PriceCalculationBody<'_>,
    ) -> Result<PriceResponse, TaskFailure>;
}
