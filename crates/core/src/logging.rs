//! Structured logging infrastructure for keystamp clients.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.
//! Library code only emits `tracing` events; installing a subscriber is
//! left to the embedding application.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use keystamp_core::logging;
///
/// logging::init();
/// tracing::info!("Client started");
/// ```
pub fn init() {
    let _ = init_with(&LoggingConfig::default());
}

/// Initialize the logging system with JSON output for production environments.
///
/// This format is suitable for log aggregation systems and structured log analysis.
/// Log level can be configured via the `RUST_LOG` environment variable.
///
/// # Example
/// ```no_run
/// use keystamp_core::logging;
///
/// logging::init_json();
/// tracing::info!(component = "stamper", "Client started");
/// ```
pub fn init_json() {
    let _ = init_with(&LoggingConfig {
        json: true,
        ..LoggingConfig::default()
    });
}

/// Initialize logging from configuration.
///
/// `RUST_LOG` still takes precedence over `config.level`. Returns an error if a
/// global subscriber is already installed, which callers may ignore.
pub fn init_with(config: &LoggingConfig) -> crate::Result<()> {
    let filter = build_filter(&config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };

    result.map_err(|e| crate::Error::Config(format!("logging already initialized: {}", e)))
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
