//! Core types and traits for the futures trading client.
//!
//! This crate provides the foundational building blocks including:
//! - Order, account and symbol types
//! - Operator input validation
//! - The `Exchange` trait implemented by exchange adapters

pub mod types;
pub mod traits;
pub mod error;
pub mod validation;

pub use error::{BotError, BotResult, ErrorKind, ExchangeError, ValidationError};
pub use types::*;
pub use traits::*;
