//! Paper exchange for dry runs and tests.
//!
//! Market orders fill immediately at the configured mark price (plus
//! slippage), marketable limit orders fill at their limit, everything else
//! rests until canceled. There is no order book and no position tracking.

use async_trait::async_trait;
use bot_core::error::ExchangeError;
use bot_core::traits::Exchange;
use bot_core::types::{
    AccountBalance, AssetBalance, OrderResult, OrderStatus, OrderType, PriceTicker, Side,
    SymbolInfo, TimeInForce,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const INVALID_SYMBOL: i64 = -1121;

struct PaperState {
    orders: HashMap<i64, OrderResult>,
    marks: HashMap<String, Decimal>,
    next_id: i64,
}

/// In-memory exchange implementing the same contract as the live adapter.
pub struct PaperExchange {
    state: Mutex<PaperState>,
    wallet_balance: Decimal,
    slippage_pct: Decimal,
    requests: AtomicUsize,
}

impl PaperExchange {
    /// Create a paper exchange with the given USDT wallet balance.
    pub fn new(wallet_balance: Decimal) -> Self {
        Self {
            state: Mutex::new(PaperState {
                orders: HashMap::new(),
                marks: HashMap::new(),
                next_id: 1,
            }),
            wallet_balance,
            slippage_pct: Decimal::ZERO,
            requests: AtomicUsize::new(0),
        }
    }

    /// Set slippage percentage applied to market fills.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Register a tradable symbol at the given mark price.
    pub fn with_mark_price(self, symbol: &str, price: Decimal) -> Self {
        self.set_mark_price(symbol, price);
        self
    }

    pub fn set_mark_price(&self, symbol: &str, price: Decimal) {
        self.state().marks.insert(symbol.to_ascii_uppercase(), price);
    }

    /// Number of exchange operations served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, PaperState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn count(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn mark(state: &PaperState, symbol: &str) -> Result<Decimal, ExchangeError> {
        state
            .marks
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::Rejected {
                code: INVALID_SYMBOL,
                message: "Invalid symbol.".into(),
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        symbol: &str,
        side: Side,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
        stop_price: Option<Decimal>,
        time_in_force: Option<TimeInForce>,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        let mut state = self.state();
        let mark = Self::mark(&state, symbol)?;

        let (status, fill_price) = match order_type {
            OrderType::Market => {
                let slip = self.slippage_pct / dec!(100);
                let fill = match side {
                    Side::Buy => mark * (Decimal::ONE + slip),
                    Side::Sell => mark * (Decimal::ONE - slip),
                };
                (OrderStatus::Filled, Some(fill))
            }
            OrderType::Limit => {
                let limit = price.unwrap_or(mark);
                let marketable = match side {
                    Side::Buy => limit >= mark,
                    Side::Sell => limit <= mark,
                };
                match (marketable, time_in_force.unwrap_or_default()) {
                    (true, TimeInForce::GTX) => (OrderStatus::Expired, None),
                    (true, _) => (OrderStatus::Filled, Some(limit)),
                    (false, TimeInForce::IOC | TimeInForce::FOK) => (OrderStatus::Expired, None),
                    (false, _) => (OrderStatus::New, None),
                }
            }
            OrderType::StopLimit => (OrderStatus::New, None),
        };

        let order_id = state.next_id;
        state.next_id += 1;

        let filled_quantity = if fill_price.is_some() { quantity } else { Decimal::ZERO };
        let client_order_id = client_order_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("paper-{}", order_id));
        let now = Utc::now();

        let raw = json!({
            "orderId": order_id,
            "symbol": symbol,
            "status": status.to_string(),
            "clientOrderId": client_order_id,
            "price": price.unwrap_or_default().to_string(),
            "avgPrice": fill_price.unwrap_or_default().to_string(),
            "origQty": quantity.to_string(),
            "executedQty": filled_quantity.to_string(),
            "timeInForce": time_in_force.unwrap_or_default().to_string(),
            "type": order_type.wire_code(),
            "side": side.as_str(),
            "stopPrice": stop_price.unwrap_or_default().to_string(),
            "updateTime": now.timestamp_millis(),
        });

        let order = OrderResult {
            order_id,
            client_order_id: Some(client_order_id),
            symbol: symbol.to_string(),
            side,
            order_type,
            status,
            quantity,
            filled_quantity,
            price,
            avg_price: fill_price,
            stop_price,
            time_in_force,
            updated_at: now,
            raw,
        };
        state.orders.insert(order_id, order.clone());

        info!("Paper order: {}", order);
        Ok(order)
    }

    fn balance(&self) -> AccountBalance {
        AccountBalance {
            total_wallet_balance: self.wallet_balance,
            available_balance: self.wallet_balance,
            total_unrealized_profit: Decimal::ZERO,
            total_margin_balance: self.wallet_balance,
            assets: vec![AssetBalance {
                asset: "USDT".to_string(),
                wallet_balance: self.wallet_balance,
                available_balance: self.wallet_balance,
                unrealized_profit: Decimal::ZERO,
            }],
        }
    }
}

#[async_trait]
impl Exchange for PaperExchange {
    async fn validate_connection(&self) -> Result<AccountBalance, ExchangeError> {
        self.count();
        Ok(self.balance())
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        self.count();
        self.record(symbol, side, OrderType::Market, quantity, None, None, None, client_order_id)
    }

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        self.count();
        self.record(
            symbol,
            side,
            OrderType::Limit,
            quantity,
            Some(price),
            None,
            Some(time_in_force),
            client_order_id,
        )
    }

    async fn place_stop_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        self.count();
        self.record(
            symbol,
            side,
            OrderType::StopLimit,
            quantity,
            Some(price),
            Some(stop_price),
            Some(time_in_force),
            client_order_id,
        )
    }

    async fn get_order_status(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<OrderResult, ExchangeError> {
        self.count();
        self.state()
            .orders
            .get(&order_id)
            .filter(|o| o.symbol == symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::NotFound {
                code: -2013,
                message: "Order does not exist.".into(),
            })
    }

    async fn cancel_order(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<OrderResult, ExchangeError> {
        self.count();
        let mut state = self.state();
        let order = state
            .orders
            .get_mut(&order_id)
            .filter(|o| o.symbol == symbol)
            .ok_or_else(|| ExchangeError::NotFound {
                code: -2011,
                message: "Unknown order sent.".into(),
            })?;

        match order.status {
            OrderStatus::Filled => Err(ExchangeError::AlreadyFilled { order_id }),
            status if status.is_terminal() => Err(ExchangeError::NotFound {
                code: -2011,
                message: "Unknown order sent.".into(),
            }),
            _ => {
                order.status = OrderStatus::Canceled;
                order.updated_at = Utc::now();
                order.raw["status"] = json!("CANCELED");
                info!("Paper order {} canceled", order_id);
                Ok(order.clone())
            }
        }
    }

    async fn list_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderResult>, ExchangeError> {
        self.count();
        let state = self.state();
        let mut orders: Vec<OrderResult> = state
            .orders
            .values()
            .filter(|o| o.status.is_active())
            .filter(|o| symbol.map_or(true, |s| o.symbol == s))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.order_id);
        Ok(orders)
    }

    async fn get_account_balance(&self) -> Result<AccountBalance, ExchangeError> {
        self.count();
        Ok(self.balance())
    }

    async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ExchangeError> {
        self.count();
        let state = self.state();
        Self::mark(&state, symbol)?;
        let (base, quote) = match symbol.strip_suffix("USDT") {
            Some(base) => (base.to_string(), "USDT".to_string()),
            None => (symbol.to_string(), String::new()),
        };
        Ok(SymbolInfo {
            symbol: symbol.to_string(),
            status: "TRADING".to_string(),
            base_asset: base,
            quote_asset: quote,
            price_precision: 2,
            quantity_precision: 3,
            tick_size: Some(dec!(0.01)),
            step_size: Some(dec!(0.001)),
            min_qty: Some(dec!(0.001)),
            max_qty: None,
            min_notional: None,
            current_price: None,
        })
    }

    async fn get_current_price(&self, symbol: &str) -> Result<PriceTicker, ExchangeError> {
        self.count();
        let state = self.state();
        let price = Self::mark(&state, symbol)?;
        Ok(PriceTicker {
            symbol: symbol.to_string(),
            price,
            time: Some(Utc::now()),
        })
    }

    fn name(&self) -> &str {
        "Paper Exchange"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange() -> PaperExchange {
        PaperExchange::new(dec!(10000)).with_mark_price("BTCUSDT", dec!(50000))
    }

    #[tokio::test]
    async fn test_market_order_fills_at_mark() {
        let ex = exchange().with_slippage(dec!(0.1));
        let order = ex
            .place_market_order("BTCUSDT", Side::Buy, dec!(0.002), None)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_quantity, dec!(0.002));
        assert_eq!(order.avg_price, Some(dec!(50050)));
        assert_eq!(ex.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_symbol_rejected() {
        let ex = exchange();
        let err = ex
            .place_market_order("ETHUSDT", Side::Buy, dec!(1), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(INVALID_SYMBOL));
    }

    #[tokio::test]
    async fn test_limit_order_rests_until_canceled() {
        let ex = exchange();
        let order = ex
            .place_limit_order("BTCUSDT", Side::Buy, dec!(0.01), dec!(45000), TimeInForce::GTC, None)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::New);

        let open = ex.list_open_orders(Some("BTCUSDT")).await.unwrap();
        assert_eq!(open.len(), 1);

        let canceled = ex.cancel_order("BTCUSDT", order.order_id).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert!(ex.list_open_orders(None).await.unwrap().is_empty());

        // A second cancel finds nothing open.
        let err = ex.cancel_order("BTCUSDT", order.order_id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotFound { code: -2011, .. }));
    }

    #[tokio::test]
    async fn test_ioc_limit_expires_when_not_marketable() {
        let ex = exchange();
        let order = ex
            .place_limit_order("BTCUSDT", Side::Sell, dec!(0.01), dec!(51000), TimeInForce::IOC, None)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Expired);
    }

    #[tokio::test]
    async fn test_cancel_filled_order_reports_already_filled() {
        let ex = exchange();
        let order = ex
            .place_market_order("BTCUSDT", Side::Sell, dec!(0.001), None)
            .await
            .unwrap();
        let err = ex.cancel_order("BTCUSDT", order.order_id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::AlreadyFilled { order_id } if order_id == order.order_id));
    }

    #[tokio::test]
    async fn test_stop_limit_rests() {
        let ex = exchange();
        let order = ex
            .place_stop_limit_order(
                "BTCUSDT",
                Side::Sell,
                dec!(0.001),
                dec!(49000),
                dec!(48900),
                TimeInForce::GTC,
                Some("sl-1"),
            )
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.client_order_id.as_deref(), Some("sl-1"));
        assert_eq!(order.raw["type"], "STOP");
    }
}
