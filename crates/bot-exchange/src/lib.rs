//! Exchange integrations.

pub mod binance;
mod paper;
pub mod signer;

pub use binance::{BinanceConfig, BinanceFutures, Credentials};
pub use paper::PaperExchange;
