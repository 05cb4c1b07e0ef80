//! Exchange trait definition.

use crate::error::ExchangeError;
use crate::types::{
    AccountBalance, OrderRequest, OrderResult, PriceTicker, Side, SymbolInfo, TimeInForce,
};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Sole point of contact with a futures exchange.
///
/// Every method except `validate_connection` maps to one request against the
/// exchange. Implementations normalize responses into the core types and
/// surface every failure as an `ExchangeError`; they never retry.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Confirm the exchange is reachable and the credentials may trade
    /// futures. Returns the balance observed while checking.
    async fn validate_connection(&self) -> Result<AccountBalance, ExchangeError>;

    /// Submit a market order.
    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError>;

    /// Submit a limit order.
    async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError>;

    /// Submit a stop-limit order.
    ///
    /// The exchange keeps the order inactive until the market crosses
    /// `stop_price`, then works it as a limit order at `price`.
    #[allow(clippy::too_many_arguments)]
    async fn place_stop_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError>;

    /// Get the current state of an order.
    async fn get_order_status(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<OrderResult, ExchangeError>;

    /// Cancel an open order, returning the canceled snapshot.
    ///
    /// Fails with `NotFound` for unknown orders and `AlreadyFilled` for orders
    /// that completed before the cancel arrived.
    async fn cancel_order(&self, symbol: &str, order_id: i64)
        -> Result<OrderResult, ExchangeError>;

    /// List open orders, optionally for a single symbol.
    async fn list_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderResult>, ExchangeError>;

    /// Get wallet balances.
    async fn get_account_balance(&self) -> Result<AccountBalance, ExchangeError>;

    /// Get trading rules for a symbol.
    async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ExchangeError>;

    /// Get the latest traded price for a symbol.
    async fn get_current_price(&self, symbol: &str) -> Result<PriceTicker, ExchangeError>;

    /// Submit a validated request through the matching typed method.
    async fn submit(&self, request: &OrderRequest) -> Result<OrderResult, ExchangeError> {
        let client_id = request.client_order_id.as_deref();
        let tif = request.effective_time_in_force();
        match (request.order_type, request.price, request.stop_price) {
            (crate::OrderType::Market, _, _) => {
                self.place_market_order(&request.symbol, request.side, request.quantity, client_id)
                    .await
            }
            (crate::OrderType::Limit, Some(price), _) => {
                self.place_limit_order(
                    &request.symbol,
                    request.side,
                    request.quantity,
                    price,
                    tif,
                    client_id,
                )
                .await
            }
            (crate::OrderType::StopLimit, Some(price), Some(stop)) => {
                self.place_stop_limit_order(
                    &request.symbol,
                    request.side,
                    request.quantity,
                    stop,
                    price,
                    tif,
                    client_id,
                )
                .await
            }
            _ => Err(ExchangeError::Configuration(format!(
                "{} order for {} is missing a price",
                request.order_type, request.symbol
            ))),
        }
    }

    /// Get the exchange name.
    fn name(&self) -> &str;
}
