//! # CLI Module
//!
//! Command-line entry point for the `webapi-router` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Serve the demo API:
//!
//! ```bash
//! webapi-router serve --addr 127.0.0.1:3002
//! webapi-router serve --config webapi.toml
//! ```
//!
//! Options:
//! - `--addr <ADDR>` - Listen address, overrides the config file and `WEBAPI_ADDR`
//! - `--config <FILE>` - TOML config file (see [`crate::config`])
//!
//! ### `routes`
//!
//! Print the demo route table in registration order:
//!
//! ```bash
//! webapi-router routes
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
