//! CLI definitions.

pub mod commands;
pub mod console;
pub mod interrupt;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "futures-bot")]
#[command(author, version, about = "Command-line trading client for Binance Futures testnet")]
pub struct Cli {
    /// Configuration file path (defaults to config/default.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Binance API key
    #[arg(long, env = "BINANCE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Binance API secret
    #[arg(long, env = "BINANCE_API_SECRET", global = true, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Trade against the in-memory paper exchange instead of Binance
    #[arg(long, global = true)]
    pub paper: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive numbered menu (default)
    Menu,
    /// Place a market order
    Market(MarketArgs),
    /// Place a limit order
    Limit(LimitArgs),
    /// Place a stop-limit order
    StopLimit(StopLimitArgs),
    /// Sell stop-limit with the limit just below the stop
    StopLoss(ProtectiveArgs),
    /// Sell stop-limit with the limit just above the target
    TakeProfit(ProtectiveArgs),
    /// Execute a TWAP order
    Twap(TwapArgs),
    /// Show an order's status
    Status(OrderIdArgs),
    /// Cancel an open order
    Cancel(OrderIdArgs),
    /// List open orders
    OpenOrders(OpenOrdersArgs),
    /// Show futures wallet balances
    Balance,
    /// Show a symbol's trading rules and current price
    Symbol(SymbolArgs),
    /// Show a symbol's current price
    Price(SymbolArgs),
    /// Validate and print the effective configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct MarketArgs {
    /// Trading pair, e.g. BTCUSDT
    pub symbol: String,
    /// BUY or SELL
    pub side: String,
    pub quantity: String,
}

#[derive(clap::Args)]
pub struct LimitArgs {
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub price: String,

    /// GTC, IOC, FOK or GTX
    #[arg(long)]
    pub time_in_force: Option<String>,
}

#[derive(clap::Args)]
pub struct StopLimitArgs {
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    /// Trigger price
    pub stop_price: String,
    /// Limit price once triggered
    pub price: String,

    #[arg(long)]
    pub time_in_force: Option<String>,
}

#[derive(clap::Args)]
pub struct ProtectiveArgs {
    pub symbol: String,
    pub quantity: String,
    /// Stop (stop-loss) or target (take-profit) price
    pub trigger_price: String,

    /// Fractional distance between trigger and limit
    #[arg(long)]
    pub offset: Option<rust_decimal::Decimal>,
}

#[derive(clap::Args)]
pub struct TwapArgs {
    pub symbol: String,
    pub side: String,
    /// Total quantity across all slices
    pub quantity: String,

    /// Number of child orders
    #[arg(short = 'n', long, default_value = "5")]
    pub slices: u32,

    /// Seconds between the first and last slice
    #[arg(short, long, default_value = "600")]
    pub duration: u64,

    /// Submit slices as limit orders at this price
    #[arg(long)]
    pub limit_price: Option<String>,

    #[arg(long)]
    pub time_in_force: Option<String>,

    /// Stop at the first failed slice
    #[arg(long)]
    pub abort_on_failure: bool,
}

#[derive(clap::Args)]
pub struct OrderIdArgs {
    pub symbol: String,
    pub order_id: String,
}

#[derive(clap::Args)]
pub struct OpenOrdersArgs {
    /// Limit to one symbol
    pub symbol: Option<String>,
}

#[derive(clap::Args)]
pub struct SymbolArgs {
    pub symbol: String,
}
