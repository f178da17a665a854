use crate::config::ServerConfig;
use crate::demo::demo_api;
use crate::logging::init_logging_with_config;
use crate::server::HttpServer;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for the demo API server
#[derive(Parser)]
#[command(name = "webapi-router")]
#[command(about = "Regex-routed JSON resource API", long_about = None, version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the demo API
    Serve {
        /// Address to listen on (overrides config file and WEBAPI_ADDR)
        #[arg(long)]
        addr: Option<String>,

        /// Path to a TOML config file
        #[arg(short, long, env = "WEBAPI_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the demo route table
    Routes,
}

/// Execute the parsed CLI command
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, logging cannot be
/// initialized, the server fails to bind, or the server coroutine panics.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { addr, config } => {
            let mut server_config = ServerConfig::load(config.as_deref())?;
            if let Some(addr) = addr {
                server_config.addr = addr;
            }
            init_logging_with_config(&server_config.log_config())?;

            may::config().set_stack_size(server_config.stack_size);
            info!(
                stack_size = server_config.stack_size,
                addr = %server_config.addr,
                "Starting demo API"
            );

            let api = demo_api()?;
            let handle = HttpServer::new(api)
                .start(server_config.addr.as_str())
                .with_context(|| format!("Failed to bind {}", server_config.addr))?;
            handle
                .join()
                .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))?;
            Ok(())
        }
        Commands::Routes => {
            let api = demo_api()?;
            for route in api.router().iter() {
                let methods: Vec<String> = route
                    .target()
                    .capabilities()
                    .allowed_methods()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!("{:<32} {}", route.pattern(), methods.join(","));
            }
            Ok(())
        }
    }
}
