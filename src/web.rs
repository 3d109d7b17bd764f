#![cfg(not(tarpaulin_include))]

use clap::Parser;
use savings_calculator::{app, config::ServerConfig, logging};

/// Main entry point for the web application
///
/// Reads the server settings from the command line and environment, then
/// serves the calculator page and its API until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = ServerConfig::parse();
    tracing::info!(database = %config.database_dir.display(), "starting savings calculator");

    app::run(config).await
}
