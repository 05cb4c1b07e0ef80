//! Order handlers: validate operator input, then call the exchange.

use bot_core::error::{BotResult, ExchangeError};
use bot_core::traits::Exchange;
use bot_core::types::{
    round_down_to_step, round_up_to_step, AccountBalance, OrderRequest, OrderResult, OrderType, PriceTicker, Side,
    SymbolInfo,
};
use bot_core::validation::{self, RawOrder};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, info, warn};

/// Default distance between trigger and limit for stop-loss and
/// take-profit helpers (0.1%).
pub const DEFAULT_LIMIT_OFFSET: Decimal = dec!(0.001);

/// Stateless front door to the exchange for single orders and queries.
#[derive(Clone, Copy)]
pub struct OrderHandler<'a> {
    exchange: &'a dyn Exchange,
}

impl<'a> OrderHandler<'a> {
    pub fn new(exchange: &'a dyn Exchange) -> Self {
        Self { exchange }
    }

    /// Validate raw input and submit it.
    pub async fn submit_raw(&self, raw: &RawOrder) -> BotResult<OrderResult> {
        let request = validation::validate_order(raw)?;
        self.submit(&request).await
    }

    /// Submit an already-typed request after re-checking its invariants.
    pub async fn submit(&self, request: &OrderRequest) -> BotResult<OrderResult> {
        request.validate()?;
        if request.order_type == OrderType::StopLimit {
            warn_on_inverted_stop(request);
        }
        info!(
            "Order parameters validated: {} {} {} {}",
            request.symbol, request.side, request.order_type, request.quantity
        );

        self.exchange.submit(request).await.map_err(|e| {
            error!("{} order for {} failed: {}", request.order_type, request.symbol, e);
            e.into()
        })
    }

    pub async fn place_market(&self, symbol: &str, side: &str, quantity: &str) -> BotResult<OrderResult> {
        self.submit_raw(&RawOrder::market(symbol, side, quantity)).await
    }

    pub async fn place_limit(
        &self,
        symbol: &str,
        side: &str,
        quantity: &str,
        price: &str,
        time_in_force: Option<&str>,
    ) -> BotResult<OrderResult> {
        let mut raw = RawOrder::limit(symbol, side, quantity, price);
        if let Some(tif) = time_in_force {
            raw = raw.with_time_in_force(tif);
        }
        self.submit_raw(&raw).await
    }

    pub async fn place_stop_limit(
        &self,
        symbol: &str,
        side: &str,
        quantity: &str,
        stop_price: &str,
        price: &str,
        time_in_force: Option<&str>,
    ) -> BotResult<OrderResult> {
        let mut raw = RawOrder::stop_limit(symbol, side, quantity, stop_price, price);
        if let Some(tif) = time_in_force {
            raw = raw.with_time_in_force(tif);
        }
        self.submit_raw(&raw).await
    }

    /// Sell stop-limit with the limit `offset` below the stop, floored to
    /// the symbol's tick.
    pub async fn place_stop_loss(
        &self,
        symbol: &str,
        quantity: &str,
        stop_price: &str,
        offset: Option<Decimal>,
    ) -> BotResult<OrderResult> {
        let symbol = validation::parse_symbol(symbol)?;
        validation::parse_quantity(quantity)?;
        let stop = validation::parse_price("stop price", Some(stop_price))?;
        let tick = self.tick_size(&symbol).await;
        let limit = protective_limit(stop, -offset.unwrap_or(DEFAULT_LIMIT_OFFSET), tick);
        info!("Placing STOP LOSS: {} {} @ Stop: {}, Limit: {}", quantity, symbol, stop, limit);
        self.submit_raw(&RawOrder::stop_limit(
            &symbol,
            "SELL",
            quantity,
            &stop.to_string(),
            &limit.to_string(),
        ))
        .await
    }

    /// Sell stop-limit with the limit `offset` above the target, raised to
    /// the symbol's tick.
    pub async fn place_take_profit(
        &self,
        symbol: &str,
        quantity: &str,
        target_price: &str,
        offset: Option<Decimal>,
    ) -> BotResult<OrderResult> {
        let symbol = validation::parse_symbol(symbol)?;
        validation::parse_quantity(quantity)?;
        let target = validation::parse_price("target price", Some(target_price))?;
        let tick = self.tick_size(&symbol).await;
        let limit = protective_limit(target, offset.unwrap_or(DEFAULT_LIMIT_OFFSET), tick);
        info!("Placing TAKE PROFIT: {} {} @ Target: {}, Limit: {}", quantity, symbol, target, limit);
        self.submit_raw(&RawOrder::stop_limit(
            &symbol,
            "SELL",
            quantity,
            &target.to_string(),
            &limit.to_string(),
        ))
        .await
    }

    /// Tick size for `symbol`, or `None` when the rules cannot be fetched.
    async fn tick_size(&self, symbol: &str) -> Option<Decimal> {
        match self.exchange.get_symbol_info(symbol).await {
            Ok(info) => info.tick_size,
            Err(e) => {
                warn!("No tick size for {}, using the exact limit: {}", symbol, e);
                None
            }
        }
    }

    pub async fn order_status(&self, symbol: &str, order_id: &str) -> BotResult<OrderResult> {
        let symbol = validation::parse_symbol(symbol)?;
        let order_id = validation::parse_order_id(order_id)?;
        info!("Fetching order status: {} Order ID: {}", symbol, order_id);
        Ok(self
            .exchange
            .get_order_status(&symbol, order_id)
            .await
            .map_err(|e| log_failure("order status", e))?)
    }

    pub async fn cancel(&self, symbol: &str, order_id: &str) -> BotResult<OrderResult> {
        let symbol = validation::parse_symbol(symbol)?;
        let order_id = validation::parse_order_id(order_id)?;
        info!("Cancelling order: {} Order ID: {}", symbol, order_id);
        Ok(self
            .exchange
            .cancel_order(&symbol, order_id)
            .await
            .map_err(|e| log_failure("cancel", e))?)
    }

    /// Open orders for one symbol, or all symbols when `symbol` is blank.
    pub async fn open_orders(&self, symbol: Option<&str>) -> BotResult<Vec<OrderResult>> {
        let symbol = match symbol.map(str::trim) {
            Some(s) if !s.is_empty() => Some(validation::parse_symbol(s)?),
            _ => None,
        };
        Ok(self
            .exchange
            .list_open_orders(symbol.as_deref())
            .await
            .map_err(|e| log_failure("open orders", e))?)
    }

    pub async fn balance(&self) -> BotResult<AccountBalance> {
        info!("Fetching account balance");
        Ok(self
            .exchange
            .get_account_balance()
            .await
            .map_err(|e| log_failure("balance", e))?)
    }

    /// Trading rules plus the current price.
    pub async fn symbol_info(&self, symbol: &str) -> BotResult<SymbolInfo> {
        let symbol = validation::parse_symbol(symbol)?;
        let mut info = self
            .exchange
            .get_symbol_info(&symbol)
            .await
            .map_err(|e| log_failure("symbol info", e))?;
        let ticker = self
            .exchange
            .get_current_price(&symbol)
            .await
            .map_err(|e| log_failure("current price", e))?;
        info.current_price = Some(ticker.price);
        Ok(info)
    }

    pub async fn current_price(&self, symbol: &str) -> BotResult<PriceTicker> {
        let symbol = validation::parse_symbol(symbol)?;
        Ok(self
            .exchange
            .get_current_price(&symbol)
            .await
            .map_err(|e| log_failure("current price", e))?)
    }
}

fn log_failure(op: &str, e: ExchangeError) -> ExchangeError {
    error!("Error fetching {}: {}", op, e);
    e
}

/// `trigger × (1 + offset)` on the tick grid, rounded away from the trigger
/// so the gap never collapses. Without a tick the exact product is used.
fn protective_limit(trigger: Decimal, offset: Decimal, tick: Option<Decimal>) -> Decimal {
    let exact = (trigger * (Decimal::ONE + offset)).normalize();
    if offset.is_sign_negative() {
        round_down_to_step(exact, tick)
    } else {
        round_up_to_step(exact, tick)
    }
}

fn warn_on_inverted_stop(request: &OrderRequest) {
    if let (Some(stop), Some(limit)) = (request.stop_price, request.price) {
        match request.side {
            Side::Sell if limit > stop => {
                warn!("For SELL: limit price {} should typically be <= stop price {}", limit, stop)
            }
            Side::Buy if limit < stop => {
                warn!("For BUY: limit price {} should typically be >= stop price {}", limit, stop)
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bot_core::{ErrorKind, OrderStatus, ValidationError};
    use bot_core::BotError;
    use bot_exchange::PaperExchange;

    fn paper() -> PaperExchange {
        PaperExchange::new(dec!(10000)).with_mark_price("BTCUSDT", dec!(50000))
    }

    #[tokio::test]
    async fn test_invalid_quantity_never_reaches_exchange() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let err = handler.place_market("BTCUSDT", "BUY", "-1").await.unwrap_err();
        assert!(matches!(
            err,
            BotError::Validation(ValidationError::InvalidQuantity(_))
        ));
        assert_eq!(ex.request_count(), 0);
    }

    #[tokio::test]
    async fn test_lowercase_side_accepted() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let order = handler.place_market("btcusdt", "buy", "0.01").await.unwrap();
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.symbol, "BTCUSDT");
        assert_eq!(ex.request_count(), 1);
    }

    #[tokio::test]
    async fn test_limit_without_price_is_rejected_locally() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let err = handler
            .place_limit("BTCUSDT", "SELL", "0.01", "", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ex.request_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_loss_and_take_profit_limits() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let sl = handler
            .place_stop_loss("BTCUSDT", "0.001", "49000", None)
            .await
            .unwrap();
        assert_eq!(sl.side, Side::Sell);
        assert_eq!(sl.stop_price, Some(dec!(49000)));
        assert_eq!(sl.price, Some(dec!(48951)));

        let tp = handler
            .place_take_profit("BTCUSDT", "0.001", "51000", Some(dec!(0.002)))
            .await
            .unwrap();
        assert_eq!(tp.stop_price, Some(dec!(51000)));
        assert_eq!(tp.price, Some(dec!(51102)));
    }

    #[tokio::test]
    async fn test_cancel_filled_returns_already_filled() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let order = handler.place_market("BTCUSDT", "SELL", "0.002").await.unwrap();
        assert_eq!(order.status, OrderStatus::Filled);

        let err = handler
            .cancel("BTCUSDT", &order.order_id.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyFilled);
    }

    #[tokio::test]
    async fn test_status_rejects_bad_order_id_locally() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let err = handler.order_status("BTCUSDT", "abc").await.unwrap_err();
        assert!(matches!(
            err,
            BotError::Validation(ValidationError::InvalidOrderId(_))
        ));
        assert_eq!(ex.request_count(), 0);
    }

    #[tokio::test]
    async fn test_symbol_info_includes_current_price() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let info = handler.symbol_info("btcusdt").await.unwrap();
        assert_eq!(info.current_price, Some(dec!(50000)));
        assert_eq!(info.base_asset, "BTC");
    }

    #[tokio::test]
    async fn test_whole_number_triggers_keep_their_gap() {
        let ex = paper().with_mark_price("SOLUSDT", dec!(120));
        let handler = OrderHandler::new(&ex);

        let sl = handler
            .place_stop_loss("SOLUSDT", "1", "100.00", None)
            .await
            .unwrap();
        assert_eq!(sl.stop_price, Some(dec!(100)));
        assert_eq!(sl.price, Some(dec!(99.9)));
        assert_ne!(sl.price, sl.stop_price);

        let tp = handler
            .place_take_profit("SOLUSDT", "1", "140", None)
            .await
            .unwrap();
        assert_eq!(tp.stop_price, Some(dec!(140)));
        assert_eq!(tp.price, Some(dec!(140.14)));
    }

    #[tokio::test]
    async fn test_stop_loss_validates_before_tick_lookup() {
        let ex = paper();
        let handler = OrderHandler::new(&ex);

        let err = handler
            .place_stop_loss("BTCUSDT", "0", "49000", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ex.request_count(), 0);
    }

    #[test]
    fn test_protective_limit_rounds_away_from_trigger() {
        // 0.01 tick: 100.37 × 0.999 = 100.26963
        assert_eq!(protective_limit(dec!(100.37), dec!(-0.001), Some(dec!(0.01))), dec!(100.26));
        assert_eq!(protective_limit(dec!(100.37), dec!(0.001), Some(dec!(0.01))), dec!(100.48));
        // A coarse tick still leaves a gap.
        assert_eq!(protective_limit(dec!(100), dec!(-0.001), Some(dec!(1))), dec!(99));
        assert_eq!(protective_limit(dec!(100), dec!(-0.001), None), dec!(99.9));
    }
}
