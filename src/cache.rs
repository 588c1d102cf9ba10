//! City cache
//!
//! Concurrent name → [`CityRecord`] map shared by every worker of the city
//! resolver. Backed by a `DashMap`, so reads and writes from many workers
//! never race; two workers resolving the same uncached name both write, and
//! the first record stored wins.
//!
//! ## Usage
//!
//! ```
//! use tokio_route_pricer::cache::CityCache;
//! use tokio_route_pricer::model::CityRecord;
//! use uuid::Uuid;
//!
//! let cache = CityCache::new();
//! let record = CityRecord {
//!     city_uid: Uuid::nil(),
//!     name: "Moscow".into(),
//!     full_name: "Moscow, Russia".into(),
//! };
//! cache.insert(record.clone());
//! assert_eq!(cache.get("Moscow"), Some(record));
//! ```

use crate::model::CityRecord;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Shared, cloneable handle to the city cache.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct CityCache {
    store: Arc<DashMap<String, CityRecord>>,
}

impl CityCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-filled with previously persisted records.
    pub fn from_records(records: BTreeMap<String, CityRecord>) -> Self {
        let cache = Self::new();
        for (name, record) in records {
            cache.store.insert(name, record);
        }
        cache
    }

    /// Cached record for `name`, if any.
    pub fn get(&self, name: &str) -> Option<CityRecord> {
        self.store.get(name).map(|entry| entry.value().clone())
    }

    /// `true` if `name` is cached.
    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    /// Store a record under its own name. Idempotent: an existing entry is
    /// kept and returned.
    pub fn insert(&self, record: CityRecord) -> CityRecord {
        let entry = self
            .store
            .entry(record.name.clone())
            .or_insert_with(|| record);
        debug!(city = %entry.name, "city cached");
        entry.value().clone()
    }

    /// Number of cached cities.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Ordered copy of every entry, for persistence.
    pub fn snapshot(&self) -> BTreeMap<String, CityRecord> {
        self.store
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
