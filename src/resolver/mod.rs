//! The two concrete resolvers built on the dispatch engine.
//!
//! - [`city`]: city names → [`crate::model::CityRecord`], cache-backed
//! - [`cargo`]: cargo requests → [`crate::model::RouteResult`], two calls per item

pub mod cargo;
pub mod city;

pub use cargo::{CargoPriceProcessor, CargoPriceResolver};
pub use city::{CityLookupProcessor, CityResolver};
