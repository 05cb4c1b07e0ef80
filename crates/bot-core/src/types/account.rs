//! Account and market metadata snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Futures wallet balances, fetched fresh on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub total_wallet_balance: Decimal,
    pub available_balance: Decimal,
    pub total_unrealized_profit: Decimal,
    pub total_margin_balance: Decimal,
    /// Per-asset balances with a non-zero wallet balance
    pub assets: Vec<AssetBalance>,
}

/// Balance of a single margin asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub wallet_balance: Decimal,
    pub available_balance: Decimal,
    pub unrealized_profit: Decimal,
}

/// Trading rules and precision for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
    pub tick_size: Option<Decimal>,
    pub step_size: Option<Decimal>,
    pub min_qty: Option<Decimal>,
    pub max_qty: Option<Decimal>,
    pub min_notional: Option<Decimal>,
    /// Last traded price, when it was looked up alongside the rules
    pub current_price: Option<Decimal>,
}

impl SymbolInfo {
    pub fn is_trading(&self) -> bool {
        self.status == "TRADING"
    }

    /// Round a price down to the tick grid.
    pub fn round_price_down(&self, price: Decimal) -> Decimal {
        round_down_to_step(price, self.tick_size)
    }

    /// Round a price up to the tick grid.
    pub fn round_price_up(&self, price: Decimal) -> Decimal {
        round_up_to_step(price, self.tick_size)
    }

    /// Round a quantity down to the lot step grid.
    pub fn round_qty_down(&self, qty: Decimal) -> Decimal {
        round_down_to_step(qty, self.step_size)
    }
}

/// Floor `value` to a multiple of `step`. No step, or a zero step, leaves it
/// unchanged.
pub fn round_down_to_step(value: Decimal, step: Option<Decimal>) -> Decimal {
    match step {
        Some(step) if !step.is_zero() => ((value / step).floor() * step).normalize(),
        _ => value,
    }
}

/// Ceiling counterpart of [`round_down_to_step`].
pub fn round_up_to_step(value: Decimal, step: Option<Decimal>) -> Decimal {
    match step {
        Some(step) if !step.is_zero() => ((value / step).ceil() * step).normalize(),
        _ => value,
    }
}

/// Latest traded price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTicker {
    pub symbol: String,
    pub price: Decimal,
    pub time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc_rules() -> SymbolInfo {
        SymbolInfo {
            symbol: "BTCUSDT".into(),
            status: "TRADING".into(),
            base_asset: "BTC".into(),
            quote_asset: "USDT".into(),
            price_precision: 2,
            quantity_precision: 3,
            tick_size: Some(dec!(0.10)),
            step_size: Some(dec!(0.001)),
            min_qty: Some(dec!(0.001)),
            max_qty: None,
            min_notional: Some(dec!(100)),
            current_price: None,
        }
    }

    #[test]
    fn test_rounding_down_respects_tick_and_step() {
        let rules = btc_rules();
        assert_eq!(rules.round_price_down(dec!(100.17)), dec!(100.1));
        assert_eq!(rules.round_qty_down(dec!(0.0019)), dec!(0.001));
    }

    #[test]
    fn test_rounding_up_to_tick() {
        let rules = btc_rules();
        assert_eq!(rules.round_price_up(dec!(100.11)), dec!(100.2));
        assert_eq!(rules.round_price_up(dec!(100.1)), dec!(100.1));
        assert_eq!(round_up_to_step(dec!(5.5), None), dec!(5.5));
    }

    #[test]
    fn test_rounding_without_filters_is_identity() {
        let mut rules = btc_rules();
        rules.step_size = None;
        assert_eq!(rules.round_qty_down(dec!(0.0019)), dec!(0.0019));
        assert_eq!(round_down_to_step(dec!(5), Some(Decimal::ZERO)), dec!(5));
    }

    #[test]
    fn test_is_trading() {
        let mut rules = btc_rules();
        assert!(rules.is_trading());
        rules.status = "SETTLING".into();
        assert!(!rules.is_trading());
    }

    #[test]
    fn test_serializes_decimals_as_strings() {
        let json = serde_json::to_value(btc_rules()).unwrap();
        assert_eq!(json["tick_size"], "0.10");
        assert_eq!(json["current_price"], serde_json::Value::Null);
    }
}
