//! Route list input.
//!
//! Routes come either as CSV with a `city_from,city_to` header:
//!
//! ```text
//! city_from,city_to
//! Moscow,Kazan
//! ```
//!
//! or as TOML, which can carry its own `[params]`:
//!
//! ```toml
//! [params]
//! tariff_description = "12:00"
//!
//! [[routes]]
//! city_from = "Moscow"
//! city_to = "Kazan"
//! ```
//!
//! Parameters can also come from a separate CSV whose first data row is
//! read (`mode,cargo_type_descr,tariff_description`). Each parameter present
//! overrides the matching field of the run config's `[request]` section.

use crate::config::RequestSettings;
use crate::PricerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// An origin/destination pair to price.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Origin city name.
    pub city_from: String,
    /// Destination city name.
    pub city_to: String,
}

impl Route {
    /// Route from `city_from` to `city_to`.
    pub fn new(city_from: impl Into<String>, city_to: impl Into<String>) -> Self {
        Self {
            city_from: city_from.into(),
            city_to: city_to.into(),
        }
    }
}

/// Per-run overrides of the tariff selection.
///
/// Empty CSV fields read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteParams {
    /// Delivery mode override.
    #[serde(default)]
    pub mode: Option<String>,
    /// Tariff group override.
    #[serde(default)]
    pub cargo_type_descr: Option<String>,
    /// Tariff override.
    #[serde(default)]
    pub tariff_description: Option<String>,
}

impl RouteParams {
    /// Read parameters from a CSV file.
    ///
    /// # Errors
    ///
    /// - [`PricerError::Io`] if the file cannot be read
    /// - [`PricerError::Input`] if it is not valid CSV or has no data row
    pub fn load_csv(path: &Path) -> Result<Self, PricerError> {
        let content = std::fs::read_to_string(path).map_err(|e| PricerError::io(path, e))?;
        Self::parse_csv(&content, &path.display().to_string())
    }

    /// Parse parameter CSV text; only the first data row is used.
    ///
    /// # Errors
    ///
    /// Returns [`PricerError::Input`] on malformed CSV or a file without a
    /// data row.
    pub fn parse_csv(content: &str, source_name: &str) -> Result<Self, PricerError> {
        csv_reader(content)
            .deserialize::<RouteParams>()
            .next()
            .ok_or_else(|| PricerError::Input(format!("{source_name}: no parameter row")))?
            .map_err(|e| PricerError::Input(format!("{source_name}: {e}")))
    }
}

/// Parsed route file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteFile {
    /// Overrides of the configured request settings.
    #[serde(default)]
    pub params: RouteParams,
    /// Routes in file order.
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl RouteFile {
    /// Read and parse a route file: CSV for a `.csv` extension, TOML
    /// otherwise.
    ///
    /// # Errors
    ///
    /// - [`PricerError::Io`] if the file cannot be read
    /// - [`PricerError::Input`] if it is not a valid route file
    pub fn load(path: &Path) -> Result<Self, PricerError> {
        let content = std::fs::read_to_string(path).map_err(|e| PricerError::io(path, e))?;
        let source_name = path.display().to_string();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::parse_csv(&content, &source_name)
        } else {
            Self::parse(&content, &source_name)
        }
    }

    /// Parse CSV route text with a `city_from,city_to` header; columns are
    /// matched by name and fields are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`PricerError::Input`] on malformed CSV, a missing column or
    /// a route with an empty city name.
    pub fn parse_csv(content: &str, source_name: &str) -> Result<Self, PricerError> {
        let routes = csv_reader(content)
            .deserialize::<Route>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PricerError::Input(format!("{source_name}: {e}")))?;

        let file = RouteFile {
            params: RouteParams::default(),
            routes,
        };
        file.check_cities(source_name)?;
        Ok(file)
    }

    /// Parse route file text; `source_name` names it in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`PricerError::Input`] on malformed TOML or a route with an
    /// empty city name.
    pub fn parse(content: &str, source_name: &str) -> Result<Self, PricerError> {
        let file: RouteFile = toml::from_str(content)
            .map_err(|e| PricerError::Input(format!("{source_name}: {e}")))?;
        file.check_cities(source_name)?;
        Ok(file)
    }

    fn check_cities(&self, source_name: &str) -> Result<(), PricerError> {
        match self
            .routes
            .iter()
            .position(|r| r.city_from.trim().is_empty() || r.city_to.trim().is_empty())
        {
            Some(index) => Err(PricerError::Input(format!(
                "{source_name}: route #{} has an empty city name",
                index + 1
            ))),
            None => Ok(()),
        }
    }

    /// Every distinct city named by any route, sorted.
    pub fn unique_cities(&self) -> Vec<String> {
        self.routes
            .iter()
            .flat_map(|r| [r.city_from.clone(), r.city_to.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `base` with this file's `[params]` applied.
    pub fn settings(&self, base: &RequestSettings) -> RequestSettings {
        let mut settings = base.clone();
        if let Some(mode) = &self.params.mode {
            settings.mode = mode.clone();
        }
        if let Some(cargo_type_descr) = &self.params.cargo_type_descr {
            settings.cargo_type_descr = cargo_type_descr.clone();
        }
        if let Some(tariff_description) = &self.params.tariff_description {
            settings.tariff_description = tariff_description.clone();
        }
        settings
    }
}

fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}
