//! JSON file backing of the city cache.

use super::{ensure_parent, CityStore};
use crate::model::CityRecord;
use crate::PricerError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// City cache kept as a JSON object `{ "<name>": CityRecord, ... }`.
///
/// A missing or empty file reads as an empty cache, so the first run needs
/// no setup.
#[derive(Debug, Clone)]
pub struct JsonCityStore {
    path: PathBuf,
}

impl JsonCityStore {
    /// Store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CityStore for JsonCityStore {
    fn load(&self) -> Result<BTreeMap<String, CityRecord>, PricerError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no city cache yet");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(PricerError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, cities: &BTreeMap<String, CityRecord>) -> Result<(), PricerError> {
        ensure_parent(&self.path)?;
        let json = serde_json::to_string_pretty(cities)?;
        std::fs::write(&self.path, json).map_err(|e| PricerError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), cities = cities.len(), "city cache saved");
        Ok(())
    }
}
