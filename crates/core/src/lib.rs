//! Core functionality shared by the keystamp client crates.
//!
//! This crate provides the error type, configuration and logging setup used
//! by the key-encapsulation, credential-bundle and request-stamping layers.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ApiConfig, Config, LoggingConfig, DEFAULT_API_BASE_URL};
pub use error::{Error, ErrorKind, Result};
