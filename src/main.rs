//! Binance Futures testnet trading client.

mod cli;

use anyhow::{Context, Result};
use bot_config::load_config;
use bot_core::BotError;
use bot_monitor::setup_logging;
use clap::Parser;
use cli::commands::{self, menu, orders, queries, twap, validate};
use cli::console::Console;
use cli::interrupt::Interrupt;
use cli::{Cli, Commands, DEFAULT_CONFIG};
use std::path::{Path, PathBuf};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // An explicit --config must exist; the default path is optional.
    let (config_path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    let config = load_config(&config_path, required)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    // Setup logging
    let log_level = cli
        .log_level
        .map(|level| level.as_str())
        .unwrap_or(config.logging.level.as_str());
    let _log_guard = setup_logging(
        log_level,
        cli.json_logs || config.logging.is_json(),
        config.logging.file.as_deref().map(Path::new),
    );

    let command = cli.command.take().unwrap_or(Commands::Menu);
    if let Commands::ValidateConfig = command {
        return validate::run(&config_path, &config).await;
    }

    config
        .validate()
        .map_err(|e| BotError::Config(e.to_string()))?;

    info!("Starting {}", config.app.name);
    let interrupt = Interrupt::install();
    let mut console = Console::new();
    let exchange = commands::connect(&cli, &config, &mut console).await?;
    let exchange = exchange.as_ref();

    // Execute command
    match &command {
        Commands::Menu => menu::run(exchange, &mut console, &config.twap, &interrupt).await,
        Commands::Market(args) => orders::market(exchange, args).await,
        Commands::Limit(args) => orders::limit(exchange, args).await,
        Commands::StopLimit(args) => orders::stop_limit(exchange, args).await,
        Commands::StopLoss(args) => orders::stop_loss(exchange, args).await,
        Commands::TakeProfit(args) => orders::take_profit(exchange, args).await,
        Commands::Twap(args) => twap::run(exchange, args, &config.twap, &interrupt).await,
        Commands::Status(args) => queries::status(exchange, args).await,
        Commands::Cancel(args) => queries::cancel(exchange, args).await,
        Commands::OpenOrders(args) => queries::open_orders(exchange, args).await,
        Commands::Balance => queries::balance(exchange).await,
        Commands::Symbol(args) => queries::symbol(exchange, args).await,
        Commands::Price(args) => queries::price(exchange, args).await,
        Commands::ValidateConfig => validate::run(&config_path, &config).await,
    }
}
