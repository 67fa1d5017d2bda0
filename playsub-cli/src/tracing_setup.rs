//! Tracing setup for the playsub binary
//!
//! Usage:
//!   playsub --debug serve             # Debug logging to console
//!   RUST_LOG=playsub_server=debug ... # Fine-grained log control
//!
//! Environment variables:
//!   RUST_LOG                          # Log filter (default: info)

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (sets the default filter to debug)
    pub debug: bool,
}

/// Default filter when `RUST_LOG` is unset.
fn default_directive(config: &TracingConfig) -> &'static str {
    if config.debug {
        "debug"
    } else {
        "info"
    }
}

/// Initialize console tracing.
pub fn init(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug) // Show targets in debug mode
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
