//! CLI command implementations.

pub mod menu;
pub mod orders;
pub mod queries;
pub mod twap;
pub mod validate;

use anyhow::{Context, Result};
use bot_config::AppConfig;
use bot_core::Exchange;
use bot_exchange::{BinanceConfig, BinanceFutures, Credentials, PaperExchange};
use tracing::{info, warn};

use crate::cli::console::Console;
use crate::cli::Cli;

/// Build the exchange for this session and check it is usable.
///
/// Any failure here ends the program.
pub async fn connect(cli: &Cli, config: &AppConfig, console: &mut Console) -> Result<Box<dyn Exchange>> {
    let exchange: Box<dyn Exchange> = if cli.paper {
        let paper = PaperExchange::new(config.paper.wallet_balance)
            .with_slippage(config.paper.slippage_pct);
        for (symbol, price) in &config.paper.mark_prices {
            paper.set_mark_price(symbol, *price);
        }
        Box::new(paper)
    } else {
        let credentials = credentials(cli, config, console).await?;
        let binance_config = BinanceConfig {
            base_url: config.exchange.base_url.clone(),
            testnet: config.exchange.testnet,
            recv_window_ms: config.exchange.recv_window_ms,
            timeout_secs: config.exchange.timeout_secs,
        };
        let mut client = BinanceFutures::new(binance_config, credentials)
            .context("Failed to initialize Binance client")?;
        if let Err(e) = client.sync_time().await {
            warn!("Server time sync failed, using local clock: {}", e);
        }
        Box::new(client)
    };

    let balance = exchange
        .validate_connection()
        .await
        .with_context(|| format!("Failed to connect to {}", exchange.name()))?;
    info!("Connected to {}", exchange.name());
    println!("Connected to {}", exchange.name());
    println!("Available balance: {} USDT", balance.available_balance);
    Ok(exchange)
}

/// Flags and `BINANCE_API_*` first, then the configured variables, then ask.
async fn credentials(cli: &Cli, config: &AppConfig, console: &mut Console) -> Result<Credentials> {
    if let (Some(key), Some(secret)) = (&cli.api_key, &cli.api_secret) {
        return Ok(Credentials::new(key.as_str(), secret.as_str()));
    }
    if let Ok(credentials) =
        Credentials::from_env(&config.exchange.api_key_env, &config.exchange.api_secret_env)
    {
        return Ok(credentials);
    }

    println!("Binance Futures testnet credentials not found in the environment.");
    let key = match &cli.api_key {
        Some(key) => key.clone(),
        None => console.ask("API key").await?,
    };
    let secret = match &cli.api_secret {
        Some(secret) => secret.clone(),
        None => console.ask("API secret").await?,
    };
    Ok(Credentials::new(key, secret))
}

/// Print a handler result in the menu; failures are shown, not propagated.
pub(crate) fn report<T>(result: bot_core::BotResult<T>, show: impl FnOnce(&T)) {
    match result {
        Ok(value) => show(&value),
        Err(e) => {
            println!("Error ({}): {}", e.kind(), e);
            if !e.is_recoverable() {
                println!("Check the API credentials and configuration before retrying.");
            }
        }
    }
}
