//! # Cargo price resolver: cargo requests → priced routes
//!
//! ## Responsibility
//! Price each [`CargoPriceRequest`] with two dependent remote calls: first
//! resolve the tariff variant (service id and delivery time) from the
//! estimate endpoint, then price the request for that variant.
//!
//! ## Guarantees
//! - Ordered per item: the price call is only issued after a tariff has
//!   been resolved, and its body always carries the service id
//! - Verbatim failures: a failed request is reported exactly as submitted
//!
//! ## NOT Responsible For
//! - Building requests from routes (see: `run`)
//! - Laying results out in a table (see: `repository::table`)

use crate::api::wire::{PricePayload, TariffEstimateResponse};
use crate::api::{PriceCalculationBody, PricingApi, ServiceIdRequest};
use crate::dispatch::{BatchReport, DispatchEngine, TaskFailure, TaskProcessor};
use crate::model::{CalculatedService, CargoPriceRequest, ResolvedTariff, RouteResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Per-item logic of the cargo price lookup.
pub struct CargoPriceProcessor {
    api: Arc<dyn PricingApi>,
}

impl CargoPriceProcessor {
    /// Processor issuing its calls through `api`.
    pub fn new(api: Arc<dyn PricingApi>) -> Self {
        Self { api }
    }

    /// Step 1: pick the tariff variant matching the request's descriptors.
    ///
    /// # Errors
    ///
    /// - [`TaskFailure::Resolution`] if no group or no tariff matches
    /// - [`TaskFailure::Transport`] if the estimate call fails
    pub async fn resolve_tariff(
        &self,
        request: &CargoPriceRequest,
    ) -> Result<ResolvedTariff, TaskFailure> {
        let estimate = self
            .api
            .estimate_tariffs(&ServiceIdRequest::from_request(request))
            .await?;
        select_tariff(&estimate, request)
    }

    /// Step 2 and 3: price the request for `tariff` and build the result.
    ///
    /// # Errors
    ///
    /// - [`TaskFailure::Price`] if the response has no price payload
    /// - [`TaskFailure::Transport`] if the price call fails
    pub async fn price(
        &self,
        request: &CargoPriceRequest,
        tariff: &ResolvedTariff,
    ) -> Result<RouteResult, TaskFailure> {
        let mut priced = request.clone();
        priced.attach_tariff(tariff);

        let response = self
            .api
            .calculate_price(&PriceCalculationBody::new(&priced, tariff))
            .await?;
        let payload = response.data.ok_or_else(|| {
            TaskFailure::Price(format!("no price data for {}", request.route_label()))
        })?;

        build_route(payload, priced, tariff)
    }
}

/// Find the group by description, then the tariff by mode and short description.
fn select_tariff(
    estimate: &TariffEstimateResponse,
    request: &CargoPriceRequest,
) -> Result<ResolvedTariff, TaskFailure> {
    let groups = estimate
        .data
        .as_deref()
        .filter(|groups| !groups.is_empty())
        .ok_or_else(|| TaskFailure::Resolution("estimate returned no tariff groups".into()))?;

    let group = groups
        .iter()
        .find(|g| g.description.as_deref() == Some(request.cargo_type_descr.as_str()))
        .ok_or_else(|| {
            TaskFailure::Resolution(format!(
                "no tariff group described as {:?}",
                request.cargo_type_descr
            ))
        })?;

    group
        .tariffs
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|t| {
            t.mode.as_deref() == Some(request.mode.as_str())
                && t.short_description.as_deref() == Some(request.tariff_description.as_str())
        })
        .find_map(|t| {
            Some(ResolvedTariff {
                service_id: t.service_id?,
                duration_min: t.duration_min.unwrap_or_default(),
                duration_max: t.duration_max.unwrap_or_default(),
            })
        })
        .ok_or_else(|| {
            TaskFailure::Resolution(format!(
                "no tariff with mode {:?} and description {:?} in group {:?}",
                request.mode, request.tariff_description, request.cargo_type_descr
            ))
        })
}

fn build_route(
    payload: PricePayload,
    request: CargoPriceRequest,
    tariff: &ResolvedTariff,
) -> Result<RouteResult, TaskFailure> {
    let (delivery_price, total_cost) = match (payload.delivery_price, payload.total_cost) {
        (Some(delivery), Some(total)) => (delivery, total),
        _ => {
            return Err(TaskFailure::Price(format!(
                "incomplete price data for {}",
                request.route_label()
            )))
        }
    };

    let services = payload
        .calculated_additional_services
        .unwrap_or_default()
        .into_iter()
        .map(|s| CalculatedService {
            alias: s.alias.unwrap_or_default(),
            original_name: s.original_name.unwrap_or_default(),
            total_cost: s
                .payment_detail
                .and_then(|d| d.total_cost)
                .unwrap_or_default(),
        })
        .collect();

    Ok(RouteResult {
        city_from: request.sender_city_name.clone(),
        city_to: request.receiver_city_name.clone(),
        delivery_price,
        total_cost,
        duration_min: tariff.duration_min,
        duration_max: tariff.duration_max,
        weight: request.weight().unwrap_or_default(),
        services,
        request,
    })
}

#[async_trait]
impl TaskProcessor for CargoPriceProcessor {
    type Item = CargoPriceRequest;
    type Output = RouteResult;

    fn describe(&self, item: &CargoPriceRequest) -> String {
        item.route_label()
    }

    async fn process(&self, item: &CargoPriceRequest) -> Result<RouteResult, TaskFailure> {
        let tariff = self.resolve_tariff(item).await?;
        self.price(item, &tariff).await
    }
}

/// Prices batches of cargo requests over a bounded worker pool.
pub struct CargoPriceResolver {
    processor: Arc<CargoPriceProcessor>,
    engine: DispatchEngine,
}

impl CargoPriceResolver {
    /// Resolver issuing its calls through `api`.
    pub fn new(api: Arc<dyn PricingApi>, engine: DispatchEngine) -> Self {
        Self {
            processor: Arc::new(CargoPriceProcessor::new(api)),
            engine,
        }
    }

    /// Price every request. Results are unordered; each echoes its request.
    pub async fn price_all(
        &self,
        requests: Vec<CargoPriceRequest>,
    ) -> (Vec<RouteResult>, BatchReport<CargoPriceRequest>) {
        let outcome = self.engine.run(requests, Arc::clone(&self.processor)).await;

        tracing::info!(
            total = outcome.report.total,
            success = outcome.report.success,
            fail = outcome.report.fail,
            "cargo pricing finished"
        );

        (outcome.results, outcome.report)
    }
}
