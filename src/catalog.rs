//! Package catalog
//!
//! Which package sizes each route is priced for, and which additional
//! services go with each size. This is business data of one courier's
//! tariff scheme, so it is configuration (`[catalog]` in the run config)
//! with the historical table as the default.

use crate::model::{AdditionalService, Package};
use serde::{Deserialize, Serialize};

/// One priced package size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Package dimensions and weight.
    pub package: Package,
    /// Services priced with this package when additional services are on.
    #[serde(default)]
    pub additional_services: Vec<AdditionalService>,
}

/// Ordered list of package sizes. Order defines the table's weight columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries, lightest first by convention.
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        let insurance = AdditionalService::single("insurance", "insurance_declaredCost", 999);
        let box2 = |count| AdditionalService::single("cartonBox2", "cartonBox2_count", count);
        let box5 = |count| AdditionalService::single("cartonBox5", "cartonBox5_count", count);

        let entry = |height, length, width, weight, services: Vec<AdditionalService>| {
            CatalogEntry {
                package: Package {
                    height,
                    length,
                    width,
                    weight,
                },
                additional_services: services,
            }
        };

        Self {
            entries: vec![
                entry(9.0, 17.0, 12.0, 0.5, vec![insurance.clone(), box2(1)]),
                entry(10.0, 23.0, 19.0, 2.0, vec![insurance.clone(), box2(1)]),
                entry(15.0, 33.0, 25.0, 3.0, vec![insurance.clone(), box5(1)]),
                entry(15.0, 33.0, 25.0, 4.0, vec![insurance.clone(), box5(1)]),
                entry(15.0, 33.0, 25.0, 5.0, vec![insurance.clone(), box5(1)]),
                entry(30.0, 60.0, 60.0, 20.0, vec![insurance, box5(4)]),
            ],
        }
    }
}

impl Catalog {
    /// Package weights in catalog order.
    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.package.weight).collect()
    }

    /// `true` if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_weights() {
        assert_eq!(Catalog::default().weights(), vec![0.5, 2.0, 3.0, 4.0, 5.0, 20.0]);
    }

    #[test]
    fn test_default_catalog_every_entry_is_insured() {
        let catalog = Catalog::default();
        assert!(catalog
            .entries
            .iter()
            .all(|e| e.additional_services.iter().any(|s| s.alias == "insurance")));
    }

    #[test]
    fn test_heaviest_entry_uses_four_boxes() {
        let catalog = Catalog::default();
        let heaviest = catalog.entries.last().unwrap();
        let boxes = heaviest
            .additional_services
            .iter()
            .find(|s| s.alias == "cartonBox5")
            .unwrap();
        assert_eq!(boxes.arguments[0].value, 4);
    }

    #[test]
    fn test_catalog_parses_from_toml_with_integer_dimensions() {
        let catalog: Catalog = toml::from_str(
            r#"
[[entries]]
package = { height = 9, length = 17, width = 12, weight = 1 }

[[entries.additional_services]]
alias = "insurance"
arguments = [{ name = "insurance_declaredCost", value = 500 }]
"#,
        )
        .unwrap();
        assert_eq!(catalog.weights(), vec![1.0]);
        assert_eq!(catalog.entries[0].additional_services[0].arguments[0].value, 500);
    }
}
