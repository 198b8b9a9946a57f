pub mod cli;
pub mod core;
pub mod providers;

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// Commands the library can execute; the binary maps its clap surface onto
/// this enum so integration tests can drive the app without a terminal.
pub enum AppCommand {
    Plan,
    Targets,
    SetWeight { symbol: String, weight: f64 },
    AddHolding { symbol: String },
    RemoveHolding { symbol: String },
    SetPriority { symbol: String },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Share planner starting...");

    let path = match config_path {
        Some(p) => PathBuf::from(p),
        None => AppConfig::default_config_path()?,
    };
    let config = AppConfig::load_from_path(&path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Plan => {
            let base_url = config
                .providers
                .yahoo
                .as_ref()
                .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
            let quote_provider =
                providers::yahoo_finance::YahooQuoteProvider::new(base_url, Cache::new());
            let currency_provider =
                providers::yahoo_finance::YahooCurrencyProvider::new(base_url, Cache::new());

            cli::plan::run(&config, &quote_provider, &currency_provider).await
        }
        AppCommand::Targets => cli::targets::show(&config),
        AppCommand::SetWeight { symbol, weight } => {
            cli::targets::set_weight(config, &path, &symbol, weight)
        }
        AppCommand::AddHolding { symbol } => cli::targets::add_holding(config, &path, &symbol),
        AppCommand::RemoveHolding { symbol } => {
            cli::targets::remove_holding(config, &path, &symbol)
        }
        AppCommand::SetPriority { symbol } => cli::targets::set_priority(config, &path, &symbol),
    }
}
