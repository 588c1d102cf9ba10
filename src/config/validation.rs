//! Configuration validation engine.
//!
//! ## Responsibility
//! Validate semantic constraints on a parsed [`PricerConfig`] that the type
//! system cannot express: ranges, non-empty strings and a catalog with
//! positive, distinct weights.
//!
//! ## Guarantees
//! - Every validation rule has at least one test that triggers it
//! - Validation collects *all* errors before returning (no short-circuit)
//! - Error messages include the field path and the invalid value
//!
//! ## NOT Responsible For
//! - Parsing TOML (that belongs to `loader`)
//! - File I/O (that belongs to `loader`)

use super::PricerConfig;

/// Largest accepted worker pool.
pub const MAX_WORKER_LIMIT: usize = 100;

/// Errors arising from configuration parsing, validation, or I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("Parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("Field '{field}' has invalid value {value}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g., "dispatch.worker_limit").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn require_non_empty(errors: &mut Vec<ConfigError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ConfigError::InvalidField {
            field: field.into(),
            value: String::new(),
            reason: "must not be empty".into(),
        });
    }
}

/// Validate all semantic constraints on a [`PricerConfig`].
///
/// Collects every violation before returning so the caller sees the full
/// scope of issues at once.
///
/// # Returns
///
/// - `Ok(())` if all constraints pass.
/// - `Err(Vec<ConfigError>)` with every violation found.
pub fn validate(config: &PricerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // ── Worker pool ──────────────────────────────────────────────────
    let limit = config.dispatch.worker_limit;
    if !(1..=MAX_WORKER_LIMIT).contains(&limit) {
        errors.push(ConfigError::InvalidField {
            field: "dispatch.worker_limit".into(),
            value: limit.to_string(),
            reason: format!("must be between 1 and {MAX_WORKER_LIMIT}"),
        });
    }

    if config.dispatch.item_timeout_ms == 0 {
        errors.push(ConfigError::InvalidField {
            field: "dispatch.item_timeout_ms".into(),
            value: "0".into(),
            reason: "must be at least 1ms".into(),
        });
    }

    // ── Endpoints ────────────────────────────────────────────────────
    require_non_empty(&mut errors, "api.autocomplete_url", &config.api.autocomplete_url);
    require_non_empty(&mut errors, "api.estimate_url", &config.api.estimate_url);
    require_non_empty(&mut errors, "api.price_url", &config.api.price_url);

    if config.api.request_timeout_ms == 0 {
        errors.push(ConfigError::InvalidField {
            field: "api.request_timeout_ms".into(),
            value: "0".into(),
            reason: "must be at least 1ms".into(),
        });
    }

    // ── Tariff selection ─────────────────────────────────────────────
    require_non_empty(&mut errors, "request.mode", &config.request.mode);
    require_non_empty(&mut errors, "request.cargo_type_descr", &config.request.cargo_type_descr);
    require_non_empty(
        &mut errors,
        "request.tariff_description",
        &config.request.tariff_description,
    );

    // ── Catalog ──────────────────────────────────────────────────────
    if config.catalog.is_empty() {
        errors.push(ConfigError::InvalidField {
            field: "catalog.entries".into(),
            value: "[]".into(),
            reason: "at least one package size is required".into(),
        });
    }

    for (index, entry) in config.catalog.entries.iter().enumerate() {
        let p = &entry.package;
        for (name, value) in [
            ("weight", p.weight),
            ("height", p.height),
            ("length", p.length),
            ("width", p.width),
        ] {
            if value.is_nan() || value <= 0.0 {
                errors.push(ConfigError::InvalidField {
                    field: format!("catalog.entries[{index}].package.{name}"),
                    value: value.to_string(),
                    reason: "must be positive".into(),
                });
            }
        }

        let duplicate = config.catalog.entries[..index]
            .iter()
            .any(|earlier| (earlier.package.weight - p.weight).abs() < f64::EPSILON);
        if duplicate {
            errors.push(ConfigError::InvalidField {
                field: format!("catalog.entries[{index}].package.weight"),
                value: p.weight.to_string(),
                reason: "weight already used by an earlier entry; weights key the table columns"
                    .into(),
            });
        }

        if config.request.additional_services && entry.additional_services.is_empty() {
            errors.push(ConfigError::InvalidField {
                field: format!("catalog.entries[{index}].additional_services"),
                value: "[]".into(),
                reason: "required while request.additional_services is enabled".into(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names(errors: &[ConfigError]) -> Vec<String> {
        errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::InvalidField { field, .. } => Some(field.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&PricerConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = PricerConfig::default();
        config.dispatch.worker_limit = 0;
        let errors = validate(&config).unwrap_err();
        assert_eq!(field_names(&errors), vec!["dispatch.worker_limit"]);
    }

    #[test]
    fn test_worker_limit_above_max_rejected() {
        let mut config = PricerConfig::default();
        config.dispatch.worker_limit = MAX_WORKER_LIMIT + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = PricerConfig::default();
        config.dispatch.item_timeout_ms = 0;
        config.api.request_timeout_ms = 0;
        let names = field_names(&validate(&config).unwrap_err());
        assert!(names.contains(&"dispatch.item_timeout_ms".to_string()));
        assert!(names.contains(&"api.request_timeout_ms".to_string()));
    }

    #[test]
    fn test_blank_urls_rejected() {
        let mut config = PricerConfig::default();
        config.api.price_url = "  ".into();
        let names = field_names(&validate(&config).unwrap_err());
        assert_eq!(names, vec!["api.price_url"]);
    }

    #[test]
    fn test_blank_tariff_descriptor_rejected() {
        let mut config = PricerConfig::default();
        config.request.tariff_description = String::new();
        config.request.cargo_type_descr = String::new();
        config.request.mode = String::new();
        assert_eq!(validate(&config).unwrap_err().len(), 3);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let mut config = PricerConfig::default();
        config.catalog.entries.clear();
        let names = field_names(&validate(&config).unwrap_err());
        assert_eq!(names, vec!["catalog.entries"]);
    }

    #[test]
    fn test_non_positive_package_dimensions_rejected() {
        let mut config = PricerConfig::default();
        config.catalog.entries[1].package.weight = 0.0;
        config.catalog.entries[2].package.width = f64::NAN;
        let names = field_names(&validate(&config).unwrap_err());
        assert_eq!(
            names,
            vec![
                "catalog.entries[1].package.weight",
                "catalog.entries[2].package.width"
            ]
        );
    }

    #[test]
    fn test_duplicate_catalog_weight_rejected() {
        let mut config = PricerConfig::default();
        let mut twin = config.catalog.entries[1].clone();
        twin.package.height += 1.0;
        config.catalog.entries.push(twin);
        let last = config.catalog.entries.len() - 1;
        let names = field_names(&validate(&config).unwrap_err());
        assert_eq!(names, vec![format!("catalog.entries[{last}].package.weight")]);
    }

    #[test]
    fn test_entry_without_services_rejected_only_when_enabled() {
        let mut config = PricerConfig::default();
        config.catalog.entries[0].additional_services.clear();
        let names = field_names(&validate(&config).unwrap_err());
        assert_eq!(names, vec!["catalog.entries[0].additional_services"]);

        config.request.additional_services = false;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_errors_are_collected_not_short_circuited() {
        let mut config = PricerConfig::default();
        config.dispatch.worker_limit = 0;
        config.api.estimate_url = String::new();
        config.catalog.entries.clear();
        assert_eq!(validate(&config).unwrap_err().len(), 3);
    }
}
