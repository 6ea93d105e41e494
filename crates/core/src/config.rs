//! Configuration management for keystamp clients.
//!
//! Only deployment concerns live here. Protocol constants (stamp header name,
//! signature scheme, HPKE info label) are fixed in code and cannot be overridden.

use serde::{Deserialize, Serialize};
#[cfg(feature = "config-file")]
use std::path::Path;

/// Default origin for stamped API requests.
pub const DEFAULT_API_BASE_URL: &str = "https://api.turnkey.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin that stamped requests are addressed to.
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ApiConfig {
    /// Joins the base URL and an endpoint path with exactly one `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Config {
    #[cfg(feature = "config-file")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Rejects configurations that cannot address any endpoint.
    pub fn validate(&self) -> crate::Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(crate::Error::Config("api.base_url must not be empty".into()));
        }
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(crate::Error::Config(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                base
            )));
        }
        Ok(())
    }
}
