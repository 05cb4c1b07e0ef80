//! Core data types.

mod account;
mod order;

pub use account::{round_down_to_step, round_up_to_step, AccountBalance, AssetBalance, PriceTicker, SymbolInfo};
pub use order::{OrderRequest, OrderResult, OrderStatus, OrderType, Side, TimeInForce};
