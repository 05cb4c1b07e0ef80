//! Operator input validation.
//!
//! Every function here is pure: raw strings in, typed values or a
//! `ValidationError` naming the offending field out. Nothing in this module
//! touches the network, so a request that fails here is never sent.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::{OrderRequest, OrderType, Side, TimeInForce};

/// Order fields exactly as the operator entered them.
#[derive(Debug, Clone, Default)]
pub struct RawOrder {
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: String,
    pub price: Option<String>,
    pub stop_price: Option<String>,
    pub time_in_force: Option<String>,
}

impl RawOrder {
    pub fn market(symbol: &str, side: &str, quantity: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: side.to_string(),
            order_type: "MARKET".to_string(),
            quantity: quantity.to_string(),
            ..Default::default()
        }
    }

    pub fn limit(symbol: &str, side: &str, quantity: &str, price: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: side.to_string(),
            order_type: "LIMIT".to_string(),
            quantity: quantity.to_string(),
            price: Some(price.to_string()),
            ..Default::default()
        }
    }

    pub fn stop_limit(symbol: &str, side: &str, quantity: &str, stop: &str, price: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: side.to_string(),
            order_type: "STOP_LIMIT".to_string(),
            quantity: quantity.to_string(),
            price: Some(price.to_string()),
            stop_price: Some(stop.to_string()),
            ..Default::default()
        }
    }

    pub fn with_time_in_force(mut self, tif: &str) -> Self {
        self.time_in_force = Some(tif.to_string());
        self
    }
}

/// Validate raw operator input into an `OrderRequest`.
pub fn validate_order(raw: &RawOrder) -> Result<OrderRequest, ValidationError> {
    let symbol = parse_symbol(&raw.symbol)?;
    let side = parse_side(&raw.side)?;
    let order_type = OrderType::from_str(&raw.order_type)?;
    let quantity = parse_quantity(&raw.quantity)?;

    let price = if order_type.requires_price() {
        Some(parse_price("price", raw.price.as_deref())?)
    } else {
        None
    };
    let stop_price = if order_type.requires_stop_price() {
        Some(parse_price("stop price", raw.stop_price.as_deref())?)
    } else {
        None
    };
    let time_in_force = match order_type {
        OrderType::Market => None,
        _ => Some(parse_time_in_force(raw.time_in_force.as_deref())?.unwrap_or_default()),
    };

    Ok(OrderRequest {
        symbol,
        side,
        order_type,
        quantity,
        price,
        stop_price,
        time_in_force,
        client_order_id: None,
    })
}

/// Non-empty, alphanumeric, uppercased.
pub fn parse_symbol(input: &str) -> Result<String, ValidationError> {
    let symbol = input.trim();
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidSymbol(input.to_string()));
    }
    Ok(symbol.to_ascii_uppercase())
}

pub fn parse_side(input: &str) -> Result<Side, ValidationError> {
    Side::from_str(input)
}

pub fn parse_quantity(input: &str) -> Result<Decimal, ValidationError> {
    match parse_positive(input) {
        Some(qty) => Ok(qty),
        None => Err(ValidationError::InvalidQuantity(input.to_string())),
    }
}

/// Parse a required positive price; `field` names it in the error.
pub fn parse_price(field: &'static str, input: Option<&str>) -> Result<Decimal, ValidationError> {
    let input = match input.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Err(ValidationError::MissingPrice { field }),
    };
    parse_positive(input).ok_or_else(|| ValidationError::InvalidPrice {
        field,
        value: input.to_string(),
    })
}

/// Blank input means "not supplied".
pub fn parse_time_in_force(input: Option<&str>) -> Result<Option<TimeInForce>, ValidationError> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => TimeInForce::from_str(s).map(Some),
    }
}

pub fn parse_order_id(input: &str) -> Result<i64, ValidationError> {
    match input.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidOrderId(input.to_string())),
    }
}

fn parse_positive(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()?;
    (value > Decimal::ZERO).then(|| value.normalize())
}
