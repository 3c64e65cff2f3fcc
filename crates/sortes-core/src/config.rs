//! Layered configuration
//!
//! Configuration is resolved in three layers: defaults, a TOML or JSON file,
//! then `SORTES_*` environment overrides. Validation runs last.

use crate::errors::{Result, SortesError};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SORTES_";

/// Core trait for Sortes configuration types
pub trait SortesConfig: Clone + Default + DeserializeOwned + Send + Sync + 'static {
    /// Load configuration from a `.toml` or `.json` file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SortesError::config(format!("failed to read {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| SortesError::config(format!("invalid TOML: {e}"))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SortesError::config(format!("invalid JSON: {e}"))),
            _ => Err(SortesError::config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Apply `SORTES_*` environment overrides
    fn merge_with_env(&mut self) -> Result<()>;

    /// Validate the configuration
    fn validate(&self) -> Result<()>;

    /// Load from file, apply environment overrides, then validate
    fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.merge_with_env()?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

/// Read `SORTES_<key>` and parse it, returning `None` when unset.
pub fn env_override<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let name = format!("{ENV_PREFIX}{key}");
    match std::env::var(&name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| SortesError::config(format!("invalid value in {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
