//! CLI module for the account registration service
//!
//! Provides subcommands:
//! - `serve`: HTTP server (default)
//! - `migrate`: apply the PostgreSQL schema and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Account registration service with double opt-in activation
#[derive(Parser)]
#[command(name = "account-registration")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Apply database migrations and exit
    Migrate,
}

/// Load `.env`, the configuration files and the environment, then start logging
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });

    logging::init_logging(&config.logging);

    config
}
