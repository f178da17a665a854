//! Structured logging setup
//!
//! Everything in the crate logs through `tracing`. This module installs the
//! subscriber: an [`EnvFilter`] built from the configured level (or `RUST_LOG`
//! when set), extra target directives, and a JSON or pretty `fmt` layer that
//! can write through a non-blocking `tracing-appender` worker.
//!
//! ## Environment Variables
//!
//! - `WEBAPI_LOG_LEVEL` - trace/debug/info/warn/error (default `info`)
//! - `WEBAPI_LOG_FORMAT` - `json` or `pretty` (default `json`)
//! - `WEBAPI_LOG_ASYNC` - buffered output through a background writer (default `true`)
//! - `WEBAPI_LOG_FILTER` - comma-separated extra directives, e.g. `webapi_router::router=debug`
//! - `WEBAPI_LOG_LOCATION` - include file and line (default `false`)

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a non-blocking background worker
    pub async_logging: bool,
    /// Extra directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("WEBAPI_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("WEBAPI_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            async_logging: env_flag("WEBAPI_LOG_ASYNC", true),
            target_filter: env::var("WEBAPI_LOG_FILTER")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            include_location: env_flag("WEBAPI_LOG_LOCATION", false),
        }
    }

    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    pub fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Build the filter for `config`. `RUST_LOG` takes precedence over the level.
///
/// # Errors
///
/// Returns an error if a directive in `target_filter` does not parse.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let level = config.level();
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // Connection-level chatter from the HTTP transport; keep real problems only.
    filter = filter.add_directive(
        "may_minihttp=warn"
            .parse()
            .context("Invalid built-in log directive")?,
    );

    if let Some(target_filter) = &config.target_filter {
        for directive in target_filter.split(',').map(str::trim) {
            if directive.is_empty() {
                continue;
            }
            filter = filter.add_directive(
                directive
                    .parse()
                    .with_context(|| format!("Invalid log filter directive: {directive}"))?,
            );
        }
    }
    Ok(filter)
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid or a global subscriber is
/// already installed.
///
/// # Example
///
/// ```no_run
/// use webapi_router::logging::{init_logging_with_config, LogConfig};
///
/// init_logging_with_config(&LogConfig::from_env()).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config)?);

    if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_span_list(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
        };

        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize async logging")?;

        // The writer flushes when the guard drops; keep it for the process lifetime.
        std::mem::forget(guard);
    } else {
        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_span_list(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .boxed(),
        };

        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize sync logging")?;
    }

    Ok(())
}
