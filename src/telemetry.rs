//! Tracing subscriber installation.
//!
//! The engine only emits `tracing` events. Hosts that want them printed call
//! [`init_tracing`] once at startup.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Errors that can occur while installing the subscriber
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter directive: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured directive when it parses.
///
/// # Errors
///
/// - `InvalidFilter` if the configured directive cannot be parsed
/// - `AlreadyInitialized` if a global subscriber is already set
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_directive(&config.log_level)?,
    };

    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };

    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

fn parse_directive(directive: &str) -> Result<EnvFilter, TelemetryError> {
    Ok(EnvFilter::try_new(directive)?)
}
