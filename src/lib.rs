pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::AllocateOptions;
use crate::core::config::AppConfig;
use crate::core::{AllocationResult, cache::Cache};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Allocate(AllocateOptions),
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
) -> Result<AllocationResult> {
    info!("Stock allocator starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let base_url = config.providers.yahoo_base_url();
    let price_cache = Arc::new(Cache::new());
    let sector_cache = Arc::new(Cache::new());
    let price_provider = providers::YahooFinanceProvider::new(base_url, Arc::clone(&price_cache));
    let sector_provider =
        providers::YahooSectorProvider::new(base_url, Arc::clone(&sector_cache));

    let result = match command {
        AppCommand::Allocate(options) => {
            cli::allocate::run(&config, &options, &price_provider, &sector_provider).await
        }
    };
    debug!(
        prices = ?price_cache.stats(),
        sectors = ?sector_cache.stats(),
        "Lookup cache usage"
    );
    result
}
