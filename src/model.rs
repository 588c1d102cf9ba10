//! Domain model: cities, cargo price requests and priced routes.
//!
//! These are the values that flow through the two resolvers. Wire formats
//! of the remote API live in [`crate::api::wire`]; the types here are what
//! the rest of the crate reasons about.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resolved city.
///
/// Once cached a record is never re-fetched; a name maps to at most one
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    /// Remote identifier of the city.
    pub city_uid: Uuid,
    /// Short name, exactly as queried.
    pub name: String,
    /// Full name including region, as returned by autocomplete.
    pub full_name: String,
}

/// Package dimensions (cm) and weight (kg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Height in centimetres.
    pub height: f64,
    /// Length in centimetres.
    pub length: f64,
    /// Width in centimetres.
    pub width: f64,
    /// Weight in kilograms.
    pub weight: f64,
}

/// One named argument of an additional service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArgument {
    /// Argument name, e.g. `insurance_declaredCost`.
    pub name: String,
    /// Argument value.
    pub value: i64,
}

/// An additional service requested with a shipment (insurance, boxes, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalService {
    /// Service alias understood by the price endpoint.
    pub alias: String,
    /// Arguments of the service.
    #[serde(default)]
    pub arguments: Vec<ServiceArgument>,
}

impl AdditionalService {
    /// Service with a single argument.
    pub fn single(alias: impl Into<String>, name: impl Into<String>, value: i64) -> Self {
        Self {
            alias: alias.into(),
            arguments: vec![ServiceArgument {
                name: name.into(),
                value,
            }],
        }
    }
}

/// Tariff variant selected for a request by the estimate endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTariff {
    /// Identifier of the tariff variant, required by the price call.
    pub service_id: Uuid,
    /// Minimum delivery time in days.
    pub duration_min: u32,
    /// Maximum delivery time in days.
    pub duration_max: u32,
}

/// A fully built request to price one route for one package.
///
/// `service_id` and the duration bounds stay `None` until the tariff has
/// been resolved; see [`CargoPriceRequest::attach_tariff`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoPriceRequest {
    /// Remote id of the origin city.
    pub sender_city_id: Uuid,
    /// Name of the origin city.
    pub sender_city_name: String,
    /// Remote id of the destination city.
    pub receiver_city_id: Uuid,
    /// Name of the destination city.
    pub receiver_city_name: String,
    /// Packages of the shipment. The first one defines the reported weight.
    pub packages: Vec<Package>,
    /// Delivery mode, e.g. `HOME-HOME`.
    pub mode: String,
    /// Who pays: `sender` or `receiver`.
    pub payer_type: String,
    /// Currency code, e.g. `RUB`.
    pub currency_mark: String,
    /// Description of the tariff group to pick.
    pub cargo_type_descr: String,
    /// Short description of the tariff inside the group.
    pub tariff_description: String,
    /// Additional services to price along with delivery.
    #[serde(default)]
    pub additional_services: Vec<AdditionalService>,
    /// Resolved tariff variant.
    #[serde(default)]
    pub service_id: Option<Uuid>,
    /// Resolved minimum delivery time in days.
    #[serde(default)]
    pub duration_min: Option<u32>,
    /// Resolved maximum delivery time in days.
    #[serde(default)]
    pub duration_max: Option<u32>,
}

impl CargoPriceRequest {
    /// New request between two resolved cities, with the endpoint's defaults
    /// (`HOME-HOME`, paid by sender, in `RUB`, no additional services).
    pub fn new(sender: &CityRecord, receiver: &CityRecord, packages: Vec<Package>) -> Self {
        Self {
            sender_city_id: sender.city_uid,
            sender_city_name: sender.name.clone(),
            receiver_city_id: receiver.city_uid,
            receiver_city_name: receiver.name.clone(),
            packages,
            mode: "HOME-HOME".to_string(),
            payer_type: "sender".to_string(),
            currency_mark: "RUB".to_string(),
            cargo_type_descr: String::new(),
            tariff_description: String::new(),
            additional_services: Vec::new(),
            service_id: None,
            duration_min: None,
            duration_max: None,
        }
    }

    /// Set the delivery mode.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the payer.
    pub fn with_payer_type(mut self, payer_type: impl Into<String>) -> Self {
        self.payer_type = payer_type.into();
        self
    }

    /// Set the currency.
    pub fn with_currency_mark(mut self, currency_mark: impl Into<String>) -> Self {
        self.currency_mark = currency_mark.into();
        self
    }

    /// Set the tariff group and tariff descriptors used for service-id resolution.
    pub fn with_tariff(
        mut self,
        cargo_type_descr: impl Into<String>,
        tariff_description: impl Into<String>,
    ) -> Self {
        self.cargo_type_descr = cargo_type_descr.into();
        self.tariff_description = tariff_description.into();
        self
    }

    /// Set the additional services.
    pub fn with_additional_services(mut self, services: Vec<AdditionalService>) -> Self {
        self.additional_services = services;
        self
    }

    /// Record the resolved tariff variant on this request.
    pub fn attach_tariff(&mut self, tariff: &ResolvedTariff) {
        self.service_id = Some(tariff.service_id);
        self.duration_min = Some(tariff.duration_min);
        self.duration_max = Some(tariff.duration_max);
    }

    /// Weight of the first package, if any.
    pub fn weight(&self) -> Option<f64> {
        self.packages.first().map(|p| p.weight)
    }

    /// `"<from> -> <to> (<weight> kg)"`, used as a log key.
    pub fn route_label(&self) -> String {
        match self.weight() {
            Some(w) => format!(
                "{} -> {} ({w} kg)",
                self.sender_city_name, self.receiver_city_name
            ),
            None => format!("{} -> {}", self.sender_city_name, self.receiver_city_name),
        }
    }
}

/// Cost of one additional service as calculated by the price endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedService {
    /// Service alias.
    pub alias: String,
    /// Display name.
    pub original_name: String,
    /// Cost of the service.
    pub total_cost: f64,
}

/// A priced route for one package weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Origin city name.
    pub city_from: String,
    /// Destination city name.
    pub city_to: String,
    /// Delivery price without additional services.
    pub delivery_price: f64,
    /// Total cost including additional services.
    pub total_cost: f64,
    /// Minimum delivery time in days.
    pub duration_min: u32,
    /// Maximum delivery time in days.
    pub duration_max: u32,
    /// Weight of the first package.
    pub weight: f64,
    /// Itemized additional services.
    pub services: Vec<CalculatedService>,
    /// The request this result answers, with the tariff attached.
    pub request: CargoPriceRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str) -> CityRecord {
        CityRecord {
            city_uid: Uuid::new_v4(),
            name: name.to_string(),
            full_name: format!("{name}, Russia"),
        }
    }

    fn package(weight: f64) -> Package {
        Package {
            height: 10.0,
            length: 23.0,
            width: 19.0,
            weight,
        }
    }

    #[test]
    fn test_new_request_uses_endpoint_defaults() {
        let req = CargoPriceRequest::new(&city("Moscow"), &city("Kazan"), vec![package(2.0)]);
        assert_eq!(req.mode, "HOME-HOME");
        assert_eq!(req.payer_type, "sender");
        assert_eq!(req.currency_mark, "RUB");
        assert!(req.additional_services.is_empty());
        assert!(req.service_id.is_none());
    }

    #[test]
    fn test_builder_sets_descriptors() {
        let req = CargoPriceRequest::new(&city("Moscow"), &city("Kazan"), vec![package(2.0)])
            .with_mode("DOOR-DOOR")
            .with_payer_type("receiver")
            .with_currency_mark("KZT")
            .with_tariff("Express", "16:00");
        assert_eq!(req.mode, "DOOR-DOOR");
        assert_eq!(req.payer_type, "receiver");
        assert_eq!(req.currency_mark, "KZT");
        assert_eq!(req.cargo_type_descr, "Express");
        assert_eq!(req.tariff_description, "16:00");
    }

    #[test]
    fn test_attach_tariff_fills_service_and_durations() {
        let mut req = CargoPriceRequest::new(&city("A"), &city("B"), vec![package(1.0)]);
        let tariff = ResolvedTariff {
            service_id: Uuid::new_v4(),
            duration_min: 2,
            duration_max: 4,
        };
        req.attach_tariff(&tariff);
        assert_eq!(req.service_id, Some(tariff.service_id));
        assert_eq!(req.duration_min, Some(2));
        assert_eq!(req.duration_max, Some(4));
    }

    #[test]
    fn test_weight_is_first_package() {
        let req = CargoPriceRequest::new(&city("A"), &city("B"), vec![package(3.0), package(9.0)]);
        assert_eq!(req.weight(), Some(3.0));
        let empty = CargoPriceRequest::new(&city("A"), &city("B"), Vec::new());
        assert_eq!(empty.weight(), None);
    }

    #[test]
    fn test_route_label_includes_weight() {
        let req = CargoPriceRequest::new(&city("Moscow"), &city("Kazan"), vec![package(0.5)]);
        assert_eq!(req.route_label(), "Moscow -> Kazan (0.5 kg)");
    }

    #[test]
    fn test_city_record_json_round_trip() {
        let record = city("Moscow");
        let json = serde_json::to_string(&record).unwrap();
        let back: CityRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
