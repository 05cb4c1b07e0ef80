//! Core traits.

mod exchange;

pub use exchange::Exchange;
