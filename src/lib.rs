pub mod aggregator;
pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::aggregator::Aggregator;
use crate::core::config::AppConfig;
use crate::core::{MetricCategory, RateLimiter};
use crate::providers::{HttpFetcher, ProviderRegistry};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Check {
        domain: String,
        categories: Vec<MetricCategory>,
        json: bool,
    },
    Shell,
    Quota,
    Categories,
}

/// Wires the registry, HTTP fetcher and persistent quota from configuration.
pub fn build_aggregator(config: &AppConfig) -> Result<Aggregator> {
    let registry = ProviderRegistry::new(&config.providers);
    let fetcher = HttpFetcher::new(config.request_timeout())?;
    let limiter = RateLimiter::new(store::open_quota_store(config)?, config.quota.policy());
    Ok(Aggregator::new(registry, Arc::new(fetcher), limiter))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Domain metrics starting...");

    if let AppCommand::Categories = command {
        cli::categories::run();
        return Ok(());
    }

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(quota = ?config.quota, data_path = ?config.data_path, "Loaded config");

    let aggregator = build_aggregator(&config)?;
    match command {
        AppCommand::Check {
            domain,
            categories,
            json,
        } => {
            cli::check::run(
                &aggregator,
                &domain,
                &cli::selection(&categories),
                json,
                config.redirect_display_cap,
            )
            .await
        }
        AppCommand::Shell => cli::shell::run(&aggregator, config.redirect_display_cap).await,
        AppCommand::Quota => cli::quota::run(&aggregator).await,
        AppCommand::Categories => Ok(()),
    }
}
