//! Binance USDⓈ-M Futures integration for testnet and live trading.

use async_trait::async_trait;
use bot_core::error::ExchangeError;
use bot_core::traits::Exchange;
use bot_core::types::{
    AccountBalance, AssetBalance, OrderResult, OrderStatus, OrderType, PriceTicker, Side,
    SymbolInfo, TimeInForce,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::signer::{encode_query, Signer};

pub const TESTNET_URL: &str = "https://testnet.binancefuture.com";

/// Error codes that mean the key, signature or permissions are wrong.
const AUTH_ERROR_CODES: [i64; 4] = [-2014, -2015, -1022, -2008];
/// "Unknown order sent" and "Order does not exist".
const NOT_FOUND_CODES: [i64; 2] = [-2011, -2013];
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Binance Futures connection settings.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub testnet: bool,
    pub recv_window_ms: u64,
    pub timeout_secs: u64,
}

impl BinanceConfig {
    pub fn testnet() -> Self {
        Self {
            base_url: TESTNET_URL.to_string(),
            testnet: true,
            recv_window_ms: 5000,
            timeout_secs: 10,
        }
    }
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

/// API key and secret, held in memory for the process lifetime.
pub struct Credentials {
    pub api_key: String,
    pub api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::new(api_secret.into()),
        }
    }

    /// Load from the named environment variables.
    pub fn from_env(key_var: &str, secret_var: &str) -> Result<Self, ExchangeError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| ExchangeError::Configuration(format!("{} not set", key_var)))?;
        let api_secret = std::env::var(secret_var)
            .map_err(|_| ExchangeError::Configuration(format!("{} not set", secret_var)))?;
        Ok(Self::new(api_key, api_secret))
    }
}

/// Exchange error body: `{"code": -2019, "msg": "Margin is insufficient."}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuturesOrder {
    order_id: i64,
    symbol: String,
    status: String,
    client_order_id: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    avg_price: Option<Decimal>,
    orig_qty: Decimal,
    #[serde(default)]
    executed_qty: Decimal,
    #[serde(default)]
    time_in_force: Option<String>,
    #[serde(rename = "type")]
    order_type: String,
    side: String,
    #[serde(default)]
    stop_price: Option<Decimal>,
    #[serde(default)]
    update_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuturesAccount {
    total_wallet_balance: Decimal,
    available_balance: Decimal,
    total_unrealized_profit: Decimal,
    total_margin_balance: Decimal,
    #[serde(default = "default_true")]
    can_trade: bool,
    #[serde(default)]
    assets: Vec<FuturesAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuturesAsset {
    asset: String,
    wallet_balance: Decimal,
    available_balance: Decimal,
    unrealized_profit: Decimal,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfoResp {
    symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeSymbol {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
    price_precision: u32,
    quantity_precision: u32,
    #[serde(default)]
    filters: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: Decimal,
    #[serde(default)]
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTime {
    server_time: i64,
}

fn default_true() -> bool {
    true
}

/// Binance Futures REST client.
pub struct BinanceFutures {
    config: BinanceConfig,
    api_key: String,
    signer: Signer,
    client: Client,
    time_offset_ms: i64,
}

impl BinanceFutures {
    /// Create a new client. No request is made until a method is called.
    pub fn new(config: BinanceConfig, credentials: Credentials) -> Result<Self, ExchangeError> {
        if credentials.api_key.trim().is_empty() {
            return Err(ExchangeError::Configuration("API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::Connection(e.to_string()))?;

        if config.testnet {
            info!("Initialized Binance Futures client in TESTNET mode ({})", config.base_url);
        } else {
            warn!("Initialized Binance Futures client in LIVE mode - USE WITH CAUTION");
        }

        Ok(Self {
            config,
            api_key: credentials.api_key,
            signer: Signer::new(credentials.api_secret),
            client,
            time_offset_ms: 0,
        })
    }

    /// Measure the offset between the local clock and the exchange clock and
    /// apply it to every signed request.
    pub async fn sync_time(&mut self) -> Result<i64, ExchangeError> {
        let value = self
            .public_get("server_time", "/fapi/v1/time", BTreeMap::new())
            .await?;
        let time: ServerTime = decode("server_time", value)?;
        self.time_offset_ms = time.server_time - Utc::now().timestamp_millis();
        debug!("Exchange clock offset: {} ms", self.time_offset_ms);
        Ok(self.time_offset_ms)
    }

    async fn public_get(
        &self,
        op: &'static str,
        path: &str,
        params: BTreeMap<String, String>,
    ) -> Result<Value, ExchangeError> {
        let query = encode_query(&params);
        let url = if query.is_empty() {
            format!("{}{}", self.config.base_url, path)
        } else {
            format!("{}{}?{}", self.config.base_url, path, query)
        };
        self.send(op, Method::GET, path, &query, self.client.get(url)).await
    }

    async fn signed(
        &self,
        op: &'static str,
        method: Method,
        path: &str,
        mut params: BTreeMap<String, String>,
    ) -> Result<Value, ExchangeError> {
        let logged = encode_query(&params);

        let now_ms = Utc::now().timestamp_millis() + self.time_offset_ms;
        params.insert("timestamp".to_string(), now_ms.to_string());
        params.insert("recvWindow".to_string(), self.config.recv_window_ms.to_string());
        let query = encode_query(&params);
        let signature = self.signer.sign(&query)?;

        let url = format!(
            "{}{}?{}&signature={}",
            self.config.base_url, path, query, signature
        );
        let builder = self
            .client
            .request(method.clone(), url)
            .header("X-MBX-APIKEY", &self.api_key);
        self.send(op, method, path, &logged, builder).await
    }

    async fn send(
        &self,
        op: &'static str,
        method: Method,
        path: &str,
        logged_query: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<Value, ExchangeError> {
        info!(op, %method, path, params = logged_query, "exchange request");

        let resp = builder.send().await.map_err(|e| {
            error!(op, params = logged_query, error = %e, "exchange request failed");
            ExchangeError::Connection(e.to_string())
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            error!(op, error = %e, "failed to read exchange response");
            ExchangeError::Connection(e.to_string())
        })?;

        if !status.is_success() {
            let err = map_api_error(status.as_u16(), &text);
            error!(
                op,
                params = logged_query,
                http_status = status.as_u16(),
                code = ?err.code(),
                body = %text,
                "exchange returned an error"
            );
            return Err(err);
        }

        log_response(op, status.as_u16(), &text);
        serde_json::from_str(&text).map_err(|e| {
            error!(op, error = %e, "undecodable exchange response");
            ExchangeError::Decode(format!("{}: {}", op, e))
        })
    }

    async fn place_order(
        &self,
        op: &'static str,
        mut params: BTreeMap<String, String>,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        if let Some(id) = client_order_id {
            params.insert("newClientOrderId".to_string(), id.to_string());
        }
        params.insert("newOrderRespType".to_string(), "RESULT".to_string());

        let value = self.signed(op, Method::POST, "/fapi/v1/order", params).await?;
        let order = parse_order(value)?;
        info!("Order placed: {}", order);
        Ok(order)
    }
}

fn order_params(symbol: &str, side: Side, order_type: OrderType, quantity: Decimal) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("symbol".to_string(), symbol.to_string());
    params.insert("side".to_string(), side.as_str().to_string());
    params.insert("type".to_string(), order_type.wire_code().to_string());
    params.insert("quantity".to_string(), quantity.to_string());
    params
}

fn symbol_params(symbol: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("symbol".to_string(), symbol.to_string());
    params
}

fn decode<T: serde::de::DeserializeOwned>(op: &str, value: Value) -> Result<T, ExchangeError> {
    serde_json::from_value(value).map_err(|e| ExchangeError::Decode(format!("{}: {}", op, e)))
}

/// Payloads can run to hundreds of KB (`exchangeInfo`), so only their size
/// is logged at info.
fn log_response(op: &str, http_status: u16, body: &str) {
    info!(op, http_status, bytes = body.len(), "exchange response");
    debug!(op, body, "exchange response body");
}

/// Decide a cancel that came back "unknown order". The exchange answers that
/// for filled orders too, so `status` is the follow-up status query.
pub(crate) fn resolve_unknown_cancel(
    order_id: i64,
    code: i64,
    message: String,
    status: Result<OrderResult, ExchangeError>,
) -> ExchangeError {
    match status {
        Ok(order) if order.status == OrderStatus::Filled => {
            warn!("Order {} was already filled", order_id);
            ExchangeError::AlreadyFilled { order_id }
        }
        _ => ExchangeError::NotFound { code, message },
    }
}

/// Classify a non-success response.
pub(crate) fn map_api_error(http_status: u16, body: &str) -> ExchangeError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { code, msg }) => {
            if AUTH_ERROR_CODES.contains(&code) || http_status == 401 || http_status == 403 {
                ExchangeError::Authentication {
                    code: Some(code),
                    message: msg,
                }
            } else if NOT_FOUND_CODES.contains(&code) {
                ExchangeError::NotFound { code, message: msg }
            } else {
                ExchangeError::Rejected { code, message: msg }
            }
        }
        Err(_) if http_status == 401 || http_status == 403 => ExchangeError::Authentication {
            code: None,
            message: format!("HTTP {}: {}", http_status, body),
        },
        Err(_) => ExchangeError::Connection(format!("HTTP {}: {}", http_status, body)),
    }
}

fn non_zero(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| !v.is_zero())
}

fn from_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(DateTime::from_timestamp_millis)
}

/// Normalize an order payload, keeping the raw JSON alongside.
pub(crate) fn parse_order(value: Value) -> Result<OrderResult, ExchangeError> {
    let order: FuturesOrder = decode("order", value.clone())?;

    let side = Side::from_str(&order.side)
        .map_err(|_| ExchangeError::Decode(format!("unknown side: {}", order.side)))?;
    let order_type = OrderType::from_wire(&order.order_type)
        .ok_or_else(|| ExchangeError::Decode(format!("unsupported order type: {}", order.order_type)))?;
    let status = OrderStatus::from_wire(&order.status)
        .ok_or_else(|| ExchangeError::Decode(format!("unknown order status: {}", order.status)))?;
    let time_in_force = order
        .time_in_force
        .as_deref()
        .and_then(|tif| TimeInForce::from_str(tif).ok());

    Ok(OrderResult {
        order_id: order.order_id,
        client_order_id: order.client_order_id,
        symbol: order.symbol,
        side,
        order_type,
        status,
        quantity: order.orig_qty,
        filled_quantity: order.executed_qty,
        price: non_zero(order.price),
        avg_price: non_zero(order.avg_price),
        stop_price: non_zero(order.stop_price),
        time_in_force,
        updated_at: from_millis(order.update_time).unwrap_or_else(Utc::now),
        raw: value,
    })
}

fn parse_account(value: Value) -> Result<(AccountBalance, bool), ExchangeError> {
    let account: FuturesAccount = decode("account", value)?;
    let assets = account
        .assets
        .into_iter()
        .filter(|a| !a.wallet_balance.is_zero())
        .map(|a| AssetBalance {
            asset: a.asset,
            wallet_balance: a.wallet_balance,
            available_balance: a.available_balance,
            unrealized_profit: a.unrealized_profit,
        })
        .collect();

    let balance = AccountBalance {
        total_wallet_balance: account.total_wallet_balance,
        available_balance: account.available_balance,
        total_unrealized_profit: account.total_unrealized_profit,
        total_margin_balance: account.total_margin_balance,
        assets,
    };
    Ok((balance, account.can_trade))
}

fn filter_decimal(filter: &Value, key: &str) -> Result<Option<Decimal>, ExchangeError> {
    match filter.get(key).and_then(|x| x.as_str()) {
        Some(raw) => Decimal::from_str(raw)
            .map(|d| Some(d.normalize()))
            .map_err(|e| ExchangeError::Decode(format!("{} parse: {}", key, e))),
        None => Ok(None),
    }
}

/// Pick `symbol` out of an exchangeInfo payload.
pub(crate) fn parse_symbol_info(value: Value, symbol: &str) -> Result<SymbolInfo, ExchangeError> {
    let info: ExchangeInfoResp = decode("exchange_info", value)?;
    let s = info
        .symbols
        .into_iter()
        .find(|s| s.symbol == symbol)
        .ok_or_else(|| ExchangeError::Rejected {
            code: INVALID_SYMBOL_CODE,
            message: format!("Symbol not found: {}", symbol),
        })?;

    let mut result = SymbolInfo {
        symbol: s.symbol,
        status: s.status,
        base_asset: s.base_asset,
        quote_asset: s.quote_asset,
        price_precision: s.price_precision,
        quantity_precision: s.quantity_precision,
        tick_size: None,
        step_size: None,
        min_qty: None,
        max_qty: None,
        min_notional: None,
        current_price: None,
    };

    for f in &s.filters {
        match f.get("filterType").and_then(|x| x.as_str()).unwrap_or("") {
            "PRICE_FILTER" => {
                result.tick_size = filter_decimal(f, "tickSize")?;
            }
            "LOT_SIZE" => {
                result.step_size = filter_decimal(f, "stepSize")?;
                result.min_qty = filter_decimal(f, "minQty")?;
                result.max_qty = filter_decimal(f, "maxQty")?;
            }
            "MIN_NOTIONAL" => {
                result.min_notional = match filter_decimal(f, "notional")? {
                    Some(n) => Some(n),
                    None => filter_decimal(f, "minNotional")?,
                };
            }
            _ => {}
        }
    }

    Ok(result)
}

#[async_trait]
impl Exchange for BinanceFutures {
    async fn validate_connection(&self) -> Result<AccountBalance, ExchangeError> {
        self.public_get("ping", "/fapi/v1/ping", BTreeMap::new()).await?;

        let value = self
            .signed("validate_connection", Method::GET, "/fapi/v2/account", BTreeMap::new())
            .await?;
        let (balance, can_trade) = parse_account(value)?;
        if !can_trade {
            error!("API key is not permitted to trade futures");
            return Err(ExchangeError::Authentication {
                code: None,
                message: "API key is not permitted to trade futures".into(),
            });
        }

        info!(
            "Connection successful. Account balance: {} USDT",
            balance.total_wallet_balance
        );
        Ok(balance)
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        info!("Placing MARKET {} order: {} {}", side, quantity, symbol);
        let params = order_params(symbol, side, OrderType::Market, quantity);
        self.place_order("place_market_order", params, client_order_id).await
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
        info!(
            "Placing LIMIT {} order: {} {} @ {} ({})",
            side, quantity, symbol, price, time_in_force
        );
        let mut params = order_params(symbol, side, OrderType::Limit, quantity);
        params.insert("price".to_string(), price.to_string());
        params.insert("timeInForce".to_string(), time_in_force.to_string());
        self.place_order("place_limit_order", params, client_order_id).await
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
        info!(
            "Placing STOP_LIMIT {} order: {} {} stop {} limit {} ({})",
            side, quantity, symbol, stop_price, price, time_in_force
        );
        let mut params = order_params(symbol, side, OrderType::StopLimit, quantity);
        params.insert("price".to_string(), price.to_string());
        params.insert("stopPrice".to_string(), stop_price.to_string());
        params.insert("timeInForce".to_string(), time_in_force.to_string());
        self.place_order("place_stop_limit_order", params, client_order_id).await
    }

    async fn get_order_status(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<OrderResult, ExchangeError> {
        let mut params = symbol_params(symbol);
        params.insert("orderId".to_string(), order_id.to_string());
        let value = self
            .signed("get_order_status", Method::GET, "/fapi/v1/order", params)
            .await?;
        let order = parse_order(value)?;
        info!("Order status retrieved: {} {}", order.order_id, order.status);
        Ok(order)
    }

    async fn cancel_order(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<OrderResult, ExchangeError> {
        let mut params = symbol_params(symbol);
        params.insert("orderId".to_string(), order_id.to_string());

        match self
            .signed("cancel_order", Method::DELETE, "/fapi/v1/order", params)
            .await
        {
            Ok(value) => {
                let order = parse_order(value)?;
                info!("Order {} cancelled successfully", order_id);
                Ok(order)
            }
            Err(ExchangeError::NotFound { code, message }) => {
                let status = self.get_order_status(symbol, order_id).await;
                Err(resolve_unknown_cancel(order_id, code, message, status))
            }
            Err(e) => Err(e),
        }
    }

    async fn list_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderResult>, ExchangeError> {
        let params = symbol.map(symbol_params).unwrap_or_default();
        let value = self
            .signed("list_open_orders", Method::GET, "/fapi/v1/openOrders", params)
            .await?;
        let orders = match value {
            Value::Array(items) => items
                .into_iter()
                .map(parse_order)
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(ExchangeError::Decode(format!(
                    "open orders: expected array, got {}",
                    other
                )))
            }
        };
        info!("Open orders retrieved: {}", orders.len());
        Ok(orders)
    }

    async fn get_account_balance(&self) -> Result<AccountBalance, ExchangeError> {
        let value = self
            .signed("get_account_balance", Method::GET, "/fapi/v2/account", BTreeMap::new())
            .await?;
        let (balance, _) = parse_account(value)?;
        info!("Balance retrieved: {} USDT", balance.total_wallet_balance);
        Ok(balance)
    }

    async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ExchangeError> {
        let value = self
            .public_get("get_symbol_info", "/fapi/v1/exchangeInfo", BTreeMap::new())
            .await?;
        parse_symbol_info(value, symbol)
    }

    async fn get_current_price(&self, symbol: &str) -> Result<PriceTicker, ExchangeError> {
        let value = self
            .public_get("get_current_price", "/fapi/v1/ticker/price", symbol_params(symbol))
            .await?;
        let ticker: TickerPrice = decode("ticker_price", value)?;
        Ok(PriceTicker {
            symbol: ticker.symbol,
            price: ticker.price,
            time: from_millis(ticker.time),
        })
    }

    fn name(&self) -> &str {
        if self.config.testnet {
            "Binance Futures Testnet"
        } else {
            "Binance Futures"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bot_core::ErrorKind;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn market_fill() -> Value {
        json!({
            "orderId": 4051234567_i64,
            "symbol": "BTCUSDT",
            "status": "FILLED",
            "clientOrderId": "twap-abc-0",
            "price": "0",
            "avgPrice": "64250.10",
            "origQty": "0.002",
            "executedQty": "0.002",
            "cumQuote": "128.50020",
            "timeInForce": "GTC",
            "type": "MARKET",
            "reduceOnly": false,
            "side": "BUY",
            "stopPrice": "0",
            "updateTime": 1718000000000_i64
        })
    }

    #[test]
    fn test_parse_market_fill() {
        let order = parse_order(market_fill()).unwrap();
        assert_eq!(order.order_id, 4051234567);
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.filled_quantity, dec!(0.002));
        assert_eq!(order.avg_price, Some(dec!(64250.10)));
        assert_eq!(order.price, None);
        assert_eq!(order.stop_price, None);
        assert_eq!(order.client_order_id.as_deref(), Some("twap-abc-0"));
        assert_eq!(order.updated_at.timestamp_millis(), 1718000000000);
        assert_eq!(order.raw["cumQuote"], "128.50020");
    }

    #[test]
    fn test_parse_resting_stop_order() {
        let value = json!({
            "orderId": 77,
            "symbol": "BTCUSDT",
            "status": "NEW",
            "clientOrderId": "x",
            "price": "48900",
            "avgPrice": "0.00000",
            "origQty": "0.001",
            "executedQty": "0",
            "timeInForce": "GTC",
            "type": "STOP",
            "side": "SELL",
            "stopPrice": "49000",
            "updateTime": 1718000000000_i64
        });
        let order = parse_order(value).unwrap();
        assert_eq!(order.order_type, OrderType::StopLimit);
        assert_eq!(order.stop_price, Some(dec!(49000)));
        assert_eq!(order.price, Some(dec!(48900)));
        assert_eq!(order.avg_price, None);
        assert_eq!(order.time_in_force, Some(TimeInForce::GTC));
    }

    #[test]
    fn test_parse_order_rejects_unknown_status() {
        let mut value = market_fill();
        value["status"] = json!("NEW_INSURANCE");
        assert!(matches!(parse_order(value), Err(ExchangeError::Decode(_))));
    }

    #[test]
    fn test_map_api_error() {
        let rejected = map_api_error(400, r#"{"code":-2019,"msg":"Margin is insufficient."}"#);
        assert_eq!(rejected.kind(), ErrorKind::Rejected);
        assert_eq!(rejected.code(), Some(-2019));

        let auth = map_api_error(401, r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#);
        assert_eq!(auth.kind(), ErrorKind::Authentication);

        let signature = map_api_error(400, r#"{"code":-1022,"msg":"Signature for this request is not valid."}"#);
        assert_eq!(signature.kind(), ErrorKind::Authentication);

        let unknown = map_api_error(400, r#"{"code":-2011,"msg":"Unknown order sent."}"#);
        assert_eq!(unknown.kind(), ErrorKind::NotFound);

        let missing = map_api_error(400, r#"{"code":-2013,"msg":"Order does not exist."}"#);
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let gateway = map_api_error(502, "<html>Bad Gateway</html>");
        assert_eq!(gateway.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_forbidden_json_is_authentication() {
        let err = map_api_error(403, r#"{"code":-2019,"msg":"Forbidden"}"#);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.code(), Some(-2019));

        let bare = map_api_error(403, "Forbidden");
        assert_eq!(bare.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_unknown_cancel_on_filled_order() {
        let filled = parse_order(market_fill()).unwrap();
        let err = resolve_unknown_cancel(4051234567, -2011, "Unknown order sent.".into(), Ok(filled));
        assert!(matches!(err, ExchangeError::AlreadyFilled { order_id: 4051234567 }));
    }

    #[test]
    fn test_unknown_cancel_stays_not_found() {
        let mut canceled = parse_order(market_fill()).unwrap();
        canceled.status = OrderStatus::Canceled;
        let err = resolve_unknown_cancel(7, -2011, "Unknown order sent.".into(), Ok(canceled));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), Some(-2011));

        let lookup_failed = Err(ExchangeError::Connection("timeout".into()));
        let err = resolve_unknown_cancel(7, -2011, "Unknown order sent.".into(), lookup_failed);
        assert!(matches!(err, ExchangeError::NotFound { code: -2011, .. }));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_response_body_stays_out_of_info_logs() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(captured.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            log_response("get_symbol_info", 200, r#"{"symbols":[{"symbol":"BTCUSDT"}]}"#);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("exchange response"));
        assert!(output.contains("bytes=34"));
        assert!(!output.contains("BTCUSDT"));
    }

    #[test]
    fn test_parse_account_keeps_funded_assets() {
        let value = json!({
            "totalWalletBalance": "15000.00000000",
            "availableBalance": "14800.50000000",
            "totalUnrealizedProfit": "-12.30000000",
            "totalMarginBalance": "14987.70000000",
            "canTrade": true,
            "assets": [
                {"asset": "USDT", "walletBalance": "15000.0", "availableBalance": "14800.5", "unrealizedProfit": "-12.3"},
                {"asset": "BNB", "walletBalance": "0.0", "availableBalance": "0.0", "unrealizedProfit": "0.0"}
            ]
        });
        let (balance, can_trade) = parse_account(value).unwrap();
        assert!(can_trade);
        assert_eq!(balance.total_wallet_balance, dec!(15000));
        assert_eq!(balance.total_unrealized_profit, dec!(-12.3));
        assert_eq!(balance.assets.len(), 1);
        assert_eq!(balance.assets[0].asset, "USDT");
    }

    #[test]
    fn test_parse_symbol_info_filters() {
        let value = json!({
            "timezone": "UTC",
            "symbols": [
                {
                    "symbol": "ETHUSDT", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "USDT",
                    "pricePrecision": 2, "quantityPrecision": 3, "filters": []
                },
                {
                    "symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT",
                    "pricePrecision": 2, "quantityPrecision": 3,
                    "filters": [
                        {"filterType": "PRICE_FILTER", "tickSize": "0.10", "minPrice": "556.80", "maxPrice": "4529764"},
                        {"filterType": "LOT_SIZE", "stepSize": "0.001", "minQty": "0.001", "maxQty": "1000"},
                        {"filterType": "MIN_NOTIONAL", "notional": "100"}
                    ]
                }
            ]
        });
        let info = parse_symbol_info(value, "BTCUSDT").unwrap();
        assert_eq!(info.base_asset, "BTC");
        assert_eq!(info.tick_size, Some(dec!(0.1)));
        assert_eq!(info.step_size, Some(dec!(0.001)));
        assert_eq!(info.max_qty, Some(dec!(1000)));
        assert_eq!(info.min_notional, Some(dec!(100)));
        assert_eq!(info.current_price, None);
    }

    #[test]
    fn test_parse_symbol_info_unknown_symbol() {
        let value = json!({"symbols": []});
        let err = parse_symbol_info(value, "DOGEBTC").unwrap_err();
        assert_eq!(err.code(), Some(INVALID_SYMBOL_CODE));
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let result = BinanceFutures::new(BinanceConfig::testnet(), Credentials::new("", "secret"));
        assert!(matches!(result, Err(ExchangeError::Configuration(_))));
    }
}
