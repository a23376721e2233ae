//! Logging setup
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `meterd=info`)
//! - `METERD_LOG_FORMAT`: `pretty` (default) or `json`
//! - `METERD_LOG_DIR`: also write daily-rotated files into this directory
//!
//! # Example
//!
//! ```text
//! RUST_LOG=meterd=debug METERD_LOG_FORMAT=json ./meterd
//! ```

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "meterd=info,meterd_core=info,meterd_infra_system=info";
const LOG_FILE_PREFIX: &str = "meterd.log";

/// Output format of the console layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber
pub fn init_logging() -> Result<()> {
    let format = LogFormat::from_env_value(std::env::var("METERD_LOG_FORMAT").ok().as_deref());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let console = match format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    // Blocking writer: a fatal exit skips flushing, so nothing may sit in a buffer
    let file = std::env::var("METERD_LOG_DIR").ok().map(|dir| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
