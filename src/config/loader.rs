//! Configuration file loading.
//!
//! ## Responsibility
//! Read a TOML file from disk, parse it into a [`PricerConfig`], apply
//! command-line overrides and run validation before returning.
//!
//! ## Guarantees
//! - A successfully loaded config is always validated, overrides included
//! - No file, or a blank one, yields the built-in defaults
//! - I/O errors and parse errors are distinguished in the error type
//! - File path is included in every error message
//!
//! ## NOT Responsible For
//! - Defining the config schema (that belongs to `mod.rs`)

use std::path::Path;

use super::validation::{self, ConfigError};
use super::PricerConfig;

/// Load a [`PricerConfig`] from a TOML file.
///
/// # Returns
///
/// - `Ok(PricerConfig)` if the file is readable, well-formed, and valid.
/// - `Err(ConfigError::Io)` if the file cannot be read.
/// - `Err(ConfigError::Parse)` if the TOML is malformed.
/// - `Err(ConfigError::Validation)` if semantic constraints are violated.
///
/// # Example
///
/// ```rust,ignore
/// use tokio_route_pricer::config::loader::load_from_file;
/// use std::path::Path;
///
/// let config = load_from_file(Path::new("pricer.toml"))?;
/// println!("{} workers", config.dispatch.worker_limit);
/// ```
pub fn load_from_file(path: &Path) -> Result<PricerConfig, ConfigError> {
    load(Some(path), &ConfigOverrides::default())
}

/// Load a [`PricerConfig`] from a TOML string.
///
/// `source_name` identifies the source in error messages. Blank content
/// yields the defaults.
pub fn load_from_str(content: &str, source_name: &str) -> Result<PricerConfig, ConfigError> {
    let config = parse(content, source_name)?;
    check(&config)?;
    Ok(config)
}

/// Values given on the command line that win over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replaces `dispatch.worker_limit`.
    pub worker_limit: Option<usize>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut PricerConfig) {
        if let Some(limit) = self.worker_limit {
            config.dispatch.worker_limit = limit;
        }
    }
}

/// Load the run configuration from `path` (defaults when `None`), apply
/// `overrides`, then validate the result.
///
/// # Errors
///
/// Same as [`load_from_file`]; an override that breaks a constraint is a
/// [`ConfigError::Validation`].
pub fn load(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<PricerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                file: path.display().to_string(),
                source: e,
            })?;
            parse(&content, &path.display().to_string())?
        }
        None => {
            tracing::debug!("no config file given, using defaults");
            PricerConfig::default()
        }
    };

    overrides.apply(&mut config);
    check(&config)?;
    Ok(config)
}

fn parse(content: &str, source_name: &str) -> Result<PricerConfig, ConfigError> {
    if content.trim().is_empty() {
        tracing::info!(source = source_name, "config is blank, using defaults");
        return Ok(PricerConfig::default());
    }
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        file: source_name.to_string(),
        source: e,
    })
}

fn check(config: &PricerConfig) -> Result<(), ConfigError> {
    validation::validate(config).map_err(|errors| {
        ConfigError::Validation(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_TOML: &str = r#"
[api]
autocomplete_url = "http://localhost:9000/cities/autocomplete"
request_timeout_ms = 5000

[dispatch]
worker_limit = 3

[request]
payer_type = "receiver"
tariff_description = "12:00"

[paths]
city_cache = "cache/cities.json"
"#;

    #[test]
    fn test_load_from_str_valid() {
        let config = load_from_str(VALID_TOML, "test").unwrap();
        assert_eq!(config.dispatch.worker_limit, 3);
        assert_eq!(config.api.request_timeout_ms, 5000);
        assert_eq!(config.request.payer_type, "receiver");
        assert_eq!(config.request.tariff_description, "12:00");
        assert_eq!(config.paths.city_cache, Path::new("cache/cities.json"));
    }

    #[test]
    fn test_load_from_str_keeps_unset_defaults() {
        let config = load_from_str(VALID_TOML, "test").unwrap();
        let defaults = PricerConfig::default();
        assert_eq!(config.api.price_url, defaults.api.price_url);
        assert_eq!(config.paths.results, defaults.paths.results);
        assert_eq!(config.catalog, defaults.catalog);
    }

    #[test]
    fn test_load_from_str_malformed_toml() {
        let err = load_from_str("[dispatch\nworker_limit = ", "broken.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_load_from_str_wrong_type() {
        let err = load_from_str("[dispatch]\nworker_limit = \"many\"\n", "t").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_str_validation_failure() {
        let err = load_from_str("[dispatch]\nworker_limit = 0\n", "t").unwrap_err();
        match err {
            ConfigError::Validation(msg) => assert!(msg.contains("dispatch.worker_limit")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file_valid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID_TOML.as_bytes()).unwrap();
        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.dispatch.worker_limit, 3);
    }

    #[test]
    fn test_blank_config_yields_defaults() {
        let config = load_from_str(" \n\n", "blank.toml").unwrap();
        assert_eq!(config, PricerConfig::default());
    }

    #[test]
    fn test_load_without_path_uses_defaults_and_overrides() {
        let overrides = ConfigOverrides {
            worker_limit: Some(7),
        };
        let config = load(None, &overrides).unwrap();
        assert_eq!(config.dispatch.worker_limit, 7);
        assert_eq!(config.request, PricerConfig::default().request);
    }

    #[test]
    fn test_override_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID_TOML.as_bytes()).unwrap();
        let overrides = ConfigOverrides {
            worker_limit: Some(12),
        };
        let config = load(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.dispatch.worker_limit, 12);
        assert_eq!(config.request.payer_type, "receiver");
    }

    #[test]
    fn test_invalid_override_is_validation_error() {
        let overrides = ConfigOverrides {
            worker_limit: Some(0),
        };
        let err = load(None, &overrides).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ref m) if m.contains("dispatch.worker_limit")
        ));
    }

    #[test]
    fn test_load_from_file_missing() {
        let err = load_from_file(Path::new("/nonexistent/pricer.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/pricer.toml"));
    }
}
