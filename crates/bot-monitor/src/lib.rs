//! Logging for the trading client.

mod logging;

pub use logging::setup_logging;
