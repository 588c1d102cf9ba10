//! # Repository: run input and persistent output
//!
//! ## Responsibility
//! Everything the pricing run reads from or writes to disk: the route list,
//! the city cache file and the priced table.
//!
//! ## Guarantees
//! - Storage is behind traits ([`CityStore`], [`RouteSink`]) so the run
//!   pipeline can be driven with in-memory fakes
//! - Every filesystem error carries the offending path
//!
//! ## NOT Responsible For
//! - Resolving or pricing anything (see: `resolver`)

pub mod cities;
pub mod routes;
pub mod sheet;
pub mod table;

use crate::model::{CityRecord, RouteResult};
use crate::PricerError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub use cities::JsonCityStore;
pub use routes::{Route, RouteFile, RouteParams};
pub use sheet::XlsxTableSink;
pub use table::{JsonTableSink, PriceRow, PriceTable, TableLayout};

/// Durable storage of the city cache between runs.
pub trait CityStore: Send + Sync {
    /// All stored records keyed by city name.
    ///
    /// # Errors
    ///
    /// Returns [`PricerError::Io`] or [`PricerError::Serialization`] when
    /// the backing storage is unreadable.
    fn load(&self) -> Result<BTreeMap<String, CityRecord>, PricerError>;

    /// Replace the stored records with `cities`.
    ///
    /// # Errors
    ///
    /// Returns [`PricerError::Io`] when the backing storage is unwritable.
    fn persist(&self, cities: &BTreeMap<String, CityRecord>) -> Result<(), PricerError>;
}

/// Destination of the priced routes.
pub trait RouteSink: Send + Sync {
    /// Write `results` arranged according to `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`PricerError::Io`], [`PricerError::Serialization`] or
    /// [`PricerError::Spreadsheet`] when the output cannot be written.
    fn write(&self, results: &[RouteResult], layout: &TableLayout) -> Result<(), PricerError>;
}

/// Table sink for `path`: a workbook for `.xlsx`, JSON for anything else.
pub fn table_sink(path: &Path) -> Arc<dyn RouteSink> {
    let is_xlsx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        Arc::new(XlsxTableSink::new(path))
    } else {
        Arc::new(JsonTableSink::new(path))
    }
}

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), PricerError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| PricerError::io(parent, e))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TableLayout {
        TableLayout {
            caption: "Express, HOME-HOME, 16:00".into(),
            weights: vec![0.5],
            routes: vec![Route::new("Moscow", "Kazan")],
        }
    }

    #[test]
    fn test_table_sink_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let xlsx = dir.path().join("prices.XLSX");
        let json = dir.path().join("prices.json");

        table_sink(&xlsx).write(&[], &layout()).unwrap();
        table_sink(&json).write(&[], &layout()).unwrap();

        assert!(std::fs::read(&xlsx).unwrap().starts_with(b"PK"));
        let table: PriceTable =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_ensure_parent_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a/b/c.json");
        ensure_parent(&file).unwrap();
        assert!(dir.path().join("a/b").is_dir());
        ensure_parent(Path::new("bare.json")).unwrap();
    }
}
