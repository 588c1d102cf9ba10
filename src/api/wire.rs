//! Request and response bodies of the three pricing endpoints.
//!
//! Responses are decoded leniently (most fields optional) so that a
//! structurally odd but parseable body becomes a domain failure
//! (no match, no price) rather than a transport failure.

use crate::model::{AdditionalService, CargoPriceRequest, Package, ResolvedTariff};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Autocomplete
// ============================================================================

/// Autocomplete response: `{ data: [ {name, uuid, fullName}, ... ] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteResponse {
    /// Candidate cities.
    #[serde(default)]
    pub data: Option<Vec<AutocompleteCity>>,
}

/// One autocomplete candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteCity {
    /// Short city name.
    #[serde(default)]
    pub name: Option<String>,
    /// Remote city id.
    #[serde(default)]
    pub uuid: Option<Uuid>,
    /// Full name with region.
    #[serde(default)]
    pub full_name: Option<String>,
}

// ============================================================================
// Tariff estimate
// ============================================================================

/// Body of the tariff-estimate call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceIdRequest<'a> {
    /// Who pays.
    pub payer_type: &'a str,
    /// Currency code.
    pub currency_mark: &'a str,
    /// Origin city id.
    pub sender_city_id: Uuid,
    /// Destination city id.
    pub receiver_city_id: Uuid,
    /// Packages to estimate.
    pub packages: &'a [Package],
}

impl<'a> ServiceIdRequest<'a> {
    /// Estimate body for a cargo request.
    pub fn from_request(request: &'a CargoPriceRequest) -> Self {
        Self {
            payer_type: &request.payer_type,
            currency_mark: &request.currency_mark,
            sender_city_id: request.sender_city_id,
            receiver_city_id: request.receiver_city_id,
            packages: &request.packages,
        }
    }
}

/// Tariff-estimate response: a list of tariff groups.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TariffEstimateResponse {
    /// Tariff groups.
    #[serde(default)]
    pub data: Option<Vec<TariffGroup>>,
}

/// A group of tariffs sharing one description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TariffGroup {
    /// Group description, matched against `cargo_type_descr`.
    #[serde(default)]
    pub description: Option<String>,
    /// Tariffs in the group; may be absent or `null`.
    #[serde(default)]
    pub tariffs: Option<Vec<TariffOption>>,
}

/// One tariff variant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffOption {
    /// Delivery mode.
    #[serde(default)]
    pub mode: Option<String>,
    /// Short description, matched against `tariff_description`.
    #[serde(default)]
    pub short_description: Option<String>,
    /// Service id of the variant.
    #[serde(default)]
    pub service_id: Option<Uuid>,
    /// Minimum delivery time in days.
    #[serde(default)]
    pub duration_min: Option<u32>,
    /// Maximum delivery time in days.
    #[serde(default)]
    pub duration_max: Option<u32>,
}

// ============================================================================
// Price calculation
// ============================================================================

/// Body of the price-calculation call.
///
/// Only constructible from a resolved tariff, so the serialized body always
/// carries a service id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalculationBody<'a> {
    /// `1` to price delivery only.
    pub without_additional_services: u8,
    /// Resolved tariff variant.
    pub service_id: Uuid,
    /// Delivery mode.
    pub mode: &'a str,
    /// Who pays.
    pub payer_type: &'a str,
    /// Currency code.
    pub currency_mark: &'a str,
    /// Origin city id.
    pub sender_city_id: Uuid,
    /// Destination city id.
    pub receiver_city_id: Uuid,
    /// Packages to price.
    pub packages: &'a [Package],
    /// Additional services to price.
    pub additional_services: &'a [AdditionalService],
}

impl<'a> PriceCalculationBody<'a> {
    /// Price body for a request and its resolved tariff.
    pub fn new(request: &'a CargoPriceRequest, tariff: &ResolvedTariff) -> Self {
        Self {
            without_additional_services: 0,
            service_id: tariff.service_id,
            mode: &request.mode,
            payer_type: &request.payer_type,
            currency_mark: &request.currency_mark,
            sender_city_id: request.sender_city_id,
            receiver_city_id: request.receiver_city_id,
            packages: &request.packages,
            additional_services: &request.additional_services,
        }
    }
}

/// Price-calculation response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceResponse {
    /// Price payload; absent on failure.
    #[serde(default)]
    pub data: Option<PricePayload>,
}

/// Calculated prices for one request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePayload {
    /// Delivery price without services.
    #[serde(default)]
    pub delivery_price: Option<f64>,
    /// Total cost.
    #[serde(default)]
    pub total_cost: Option<f64>,
    /// Itemized services; may be absent or `null`.
    #[serde(default)]
    pub calculated_additional_services: Option<Vec<CalculatedServiceWire>>,
}

/// One itemized service in the price payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedServiceWire {
    /// Service alias.
    #[serde(default)]
    pub alias: Option<String>,
    /// Display name (snake_case on the wire).
    #[serde(default, rename = "original_name")]
    pub original_name: Option<String>,
    /// Cost breakdown.
    #[serde(default)]
    pub payment_detail: Option<PaymentDetail>,
}

/// Cost breakdown of one service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    /// Cost of the service.
    #[serde(default)]
    pub total_cost: Option<f64>,
}
