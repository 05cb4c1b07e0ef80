//! Error types for the trading client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error returned by handlers to the shell.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Validation(_) => ErrorKind::Validation,
            BotError::Exchange(e) => e.kind(),
            BotError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Exchange-assigned error code, when the failure came from the exchange.
    pub fn code(&self) -> Option<i64> {
        match self {
            BotError::Exchange(e) => e.code(),
            _ => None,
        }
    }

    /// True when the operator can simply retry with different input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::Authentication
        )
    }
}

/// Operator input rejected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid symbol: '{0}'")]
    InvalidSymbol(String),

    #[error("Side must be BUY or SELL, got '{0}'")]
    InvalidSide(String),

    #[error("Order type must be MARKET, LIMIT or STOP_LIMIT, got '{0}'")]
    InvalidOrderType(String),

    #[error("Quantity must be a positive number, got '{0}'")]
    InvalidQuantity(String),

    #[error("{field} must be a positive number, got '{value}'")]
    InvalidPrice { field: &'static str, value: String },

    #[error("{field} is required for this order type")]
    MissingPrice { field: &'static str },

    #[error("Time in force must be one of GTC, IOC, FOK, GTX, got '{0}'")]
    InvalidTimeInForce(String),

    #[error("Order ID must be a positive integer, got '{0}'")]
    InvalidOrderId(String),

    #[error("Invalid TWAP parameters: {0}")]
    InvalidTwap(String),
}

/// Failures surfaced at the exchange facade boundary.
#[derive(Error, Debug, Clone)]
pub enum ExchangeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {message}")]
    Authentication { code: Option<i64>, message: String },

    #[error("Rejected by exchange ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Order not found ({code}): {message}")]
    NotFound { code: i64, message: String },

    #[error("Order {order_id} is already filled")]
    AlreadyFilled { order_id: i64 },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::Configuration(_) => ErrorKind::Configuration,
            ExchangeError::Connection(_) => ErrorKind::Connection,
            ExchangeError::Authentication { .. } => ErrorKind::Authentication,
            ExchangeError::Rejected { .. } => ErrorKind::Rejected,
            ExchangeError::NotFound { .. } => ErrorKind::NotFound,
            ExchangeError::AlreadyFilled { .. } => ErrorKind::AlreadyFilled,
            ExchangeError::Decode(_) => ErrorKind::Decode,
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            ExchangeError::Authentication { code, .. } => *code,
            ExchangeError::Rejected { code, .. } | ExchangeError::NotFound { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

/// Coarse classification of a failure, used in reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Configuration,
    Connection,
    Authentication,
    Rejected,
    NotFound,
    AlreadyFilled,
    Decode,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Connection => "connection",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Rejected => "rejected",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyFilled => "already_filled",
            ErrorKind::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Result type alias for handler operations.
pub type BotResult<T> = Result<T, BotError>;
