//! pinpoint/crates/configs/src/lib.rs
//!
//! Layered application configuration: built-in defaults overridden by
//! `PINPOINT_*` environment variables, with optional `.env` loading.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PinPointConfig {
    /// Name of the lost-item document collection.
    pub collection: String,
    /// URL prefix the blob store prepends to storage paths.
    pub blob_url_prefix: String,
    /// State pre-selected in the location filter.
    pub default_state: String,
}

impl Default for PinPointConfig {
    fn default() -> Self {
        Self {
            collection: "lost-items".to_string(),
            blob_url_prefix: "mem://pinpoint".to_string(),
            default_state: "Wisconsin".to_string(),
        }
    }
}

impl PinPointConfig {
    /// Defaults overridden by `PINPOINT_*` environment variables
    /// (e.g. `PINPOINT_COLLECTION=lost-items-staging`).
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = config::Config::builder()
            .set_default("collection", defaults.collection)?
            .set_default("blob_url_prefix", defaults.blob_url_prefix)?
            .set_default("default_state", defaults.default_state)?
            .add_source(config::Environment::with_prefix("PINPOINT"))
            .build()?
            .try_deserialize::<Self>()?;
        debug!(?cfg, "configuration loaded");
        Ok(cfg)
    }
}

/// Loads a `.env` file when present; missing files are fine.
pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        debug!(".env file loaded");
    }
}
