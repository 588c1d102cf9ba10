//! # Price table: priced routes laid out by route and weight
//!
//! ## Responsibility
//! Arrange [`RouteResult`]s into a table with one row per route and one
//! cost column per catalog weight, and write it out.
//!
//! ## Guarantees
//! - Rows are sorted by `(city_from, city_to)` and unique
//! - Every route of the layout gets a row, priced or not
//! - A cell holds the total cost of the result with that route and weight
//!
//! ## NOT Responsible For
//! - Pricing (see: `resolver::cargo`)

use super::{ensure_parent, Route, RouteSink};
use crate::model::RouteResult;
use crate::PricerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Shape of the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    /// `"<cargo type>, <mode>, <tariff>"`.
    pub caption: String,
    /// Weight columns, in catalog order.
    pub weights: Vec<f64>,
    /// Routes that get a row.
    pub routes: Vec<Route>,
}

/// One route's row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Origin city name.
    pub city_from: String,
    /// Destination city name.
    pub city_to: String,
    /// Total cost per weight column; `None` where nothing was priced.
    pub costs: Vec<Option<f64>>,
    /// Shortest delivery time over the row's results.
    pub duration_min: Option<u32>,
    /// Longest delivery time over the row's results.
    pub duration_max: Option<u32>,
}

/// The full table, as written by [`JsonTableSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Table caption.
    pub caption: String,
    /// Weight column headers.
    pub weights: Vec<f64>,
    /// Rows sorted by route.
    pub rows: Vec<PriceRow>,
}

impl PriceTable {
    /// Lay out `results` according to `layout`.
    ///
    /// Results whose route or weight is not part of the layout are dropped
    /// with a warning.
    pub fn build(results: &[RouteResult], layout: &TableLayout) -> Self {
        let routes: BTreeSet<&Route> = layout.routes.iter().collect();
        let mut rows: Vec<PriceRow> = routes
            .into_iter()
            .map(|route| PriceRow {
                city_from: route.city_from.clone(),
                city_to: route.city_to.clone(),
                costs: vec![None; layout.weights.len()],
                duration_min: None,
                duration_max: None,
            })
            .collect();

        for result in results {
            let row = rows
                .iter_mut()
                .find(|r| r.city_from == result.city_from && r.city_to == result.city_to);
            let column = layout
                .weights
                .iter()
                .position(|w| (w - result.weight).abs() < f64::EPSILON);

            let (Some(row), Some(column)) = (row, column) else {
                tracing::warn!(
                    city_from = %result.city_from,
                    city_to = %result.city_to,
                    weight = result.weight,
                    "result has no cell in the table"
                );
                continue;
            };

            row.costs[column] = Some(result.total_cost);
            row.duration_min = Some(
                row.duration_min
                    .map_or(result.duration_min, |d| d.min(result.duration_min)),
            );
            row.duration_max = Some(
                row.duration_max
                    .map_or(result.duration_max, |d| d.max(result.duration_max)),
            );
        }

        Self {
            caption: layout.caption.clone(),
            weights: layout.weights.clone(),
            rows,
        }
    }
}

/// Writes the [`PriceTable`] as pretty JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonTableSink {
    path: PathBuf,
}

impl JsonTableSink {
    /// Sink writing to `path`, replacing any previous content.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RouteSink for JsonTableSink {
    fn write(&self, results: &[RouteResult], layout: &TableLayout) -> Result<(), PricerError> {
        let table = PriceTable::build(results, layout);
        ensure_parent(&self.path)?;
        let json = serde_json::to_string_pretty(&table)?;
        std::fs::write(&self.path, json).map_err(|e| PricerError::io(&self.path, e))?;
        tracing::info!(
            path = %self.path.display(),
            rows = table.rows.len(),
            "price table written"
        );
        Ok(())
    }
}
