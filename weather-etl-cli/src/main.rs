//! Binary crate for the `weather-etl` batch job.
//!
//! This crate focuses on:
//! - Logging setup
//! - Resolving configuration from file, `.env` and environment
//! - Wiring the OpenWeather client and DuckDB warehouse into one run

use clap::Parser;
use log::info;

mod cli;

/// Logger settings read from `var`, defaulting to `info`.
fn logger_env(var: &str) -> env_logger::Env<'_> {
    env_logger::Env::default().filter_or(var, "info")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // .env goes first so a RUST_LOG kept there reaches the logger.
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(logger_env("RUST_LOG")).init();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let cmd = cli::Cli::parse();
    cmd.run().await
}
