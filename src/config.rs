//! # Configuration Module
//!
//! Server settings come from an optional TOML file, then environment variables
//! override individual values.
//!
//! ## File format
//!
//! ```toml
//! addr = "127.0.0.1:3002"
//! stack_size = "0x8000"
//!
//! [log]
//! level = "debug"
//! format = "pretty"
//! ```
//!
//! ## Environment Variables
//!
//! - `WEBAPI_ADDR` - listen address (default `0.0.0.0:8080`)
//! - `WEBAPI_STACK_SIZE` - coroutine stack size, decimal or `0x` hex (default `0x4000`)
//! - `WEBAPI_LOG_*` - see [`LogConfig::from_env`](crate::logging::LogConfig::from_env)

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::env;
use std::path::Path;

use crate::logging::{LogConfig, LogFormat};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Parse a size given in decimal or `0x`-prefixed hex
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn deserialize_size<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Int(usize),
        Text(String),
    }
    match Size::deserialize(d)? {
        Size::Int(n) => Ok(n),
        Size::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size '{s}'"))),
    }
}

/// `[log]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub filter: Option<String>,
    pub async_logging: Option<bool>,
    pub include_location: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: String,
    /// Stack size for coroutines in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub stack_size: usize,
    pub log: LogSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            log: LogSection::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or has unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse server config")
    }

    /// Read and parse a TOML config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load from `path` when given (defaults otherwise), then apply the
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Override values from `WEBAPI_ADDR` and `WEBAPI_STACK_SIZE`.
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(addr) = env::var("WEBAPI_ADDR") {
            if !addr.trim().is_empty() {
                self.addr = addr.trim().to_string();
            }
        }
        if let Some(size) = env::var("WEBAPI_STACK_SIZE").ok().as_deref().and_then(parse_size) {
            self.stack_size = size;
        }
    }

    /// Logging configuration: environment first, file values fill in what the
    /// environment leaves unset.
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        let section = &self.log;
        if env::var("WEBAPI_LOG_LEVEL").is_err() {
            if let Some(level) = &section.level {
                config.log_level = level.clone();
            }
        }
        if env::var("WEBAPI_LOG_FORMAT").is_err() {
            if let Some(format) = &section.format {
                config.format = LogFormat::parse(format);
            }
        }
        if config.target_filter.is_none() {
            config.target_filter = section.filter.clone();
        }
        if env::var("WEBAPI_LOG_ASYNC").is_err() {
            if let Some(a) = section.async_logging {
                config.async_logging = a;
            }
        }
        if env::var("WEBAPI_LOG_LOCATION").is_err() {
            if let Some(l) = section.include_location {
                config.include_location = l;
            }
        }
        config
    }
}
