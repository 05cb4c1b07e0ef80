//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub exchange: ExchangeSettings,
    #[serde(default)]
    pub twap: TwapSettings,
    #[serde(default)]
    pub paper: PaperSettings,
}

/// A setting that loaded but makes no sense.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("logging.format must be \"pretty\" or \"json\", got {0:?}")]
    LogFormat(String),
    #[error("exchange.base_url must be an http(s) URL, got {0:?}")]
    BaseUrl(String),
    #[error("exchange.recv_window_ms must be between 1 and 60000, got {0}")]
    RecvWindow(u64),
    #[error("exchange.timeout_secs must be positive")]
    Timeout,
    #[error("twap.client_id_prefix must be 1-12 alphanumeric characters, got {0:?}")]
    ClientIdPrefix(String),
}

impl AppConfig {
    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(SettingsError::LogFormat(self.logging.format.clone()));
        }
        let url = &self.exchange.base_url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(SettingsError::BaseUrl(url.clone()));
        }
        if !(1..=60_000).contains(&self.exchange.recv_window_ms) {
            return Err(SettingsError::RecvWindow(self.exchange.recv_window_ms));
        }
        if self.exchange.timeout_secs == 0 {
            return Err(SettingsError::Timeout);
        }
        // Binance caps client order IDs at 36 characters; leave room for the
        // run id and slice index.
        let prefix = &self.twap.client_id_prefix;
        if prefix.is_empty() || prefix.len() > 12 || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SettingsError::ClientIdPrefix(prefix.clone()));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "futures-bot".to_string(),
            environment: "testnet".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Append-only log file; `None` logs to the console only
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: Some("bot.log".to_string()),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

/// Binance Futures connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub base_url: String,
    pub testnet: bool,
    pub recv_window_ms: u64,
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Environment variable holding the API secret
    pub api_secret_env: String,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://testnet.binancefuture.com".to_string(),
            testnet: true,
            recv_window_ms: 5000,
            timeout_secs: 10,
            api_key_env: "BINANCE_API_KEY".to_string(),
            api_secret_env: "BINANCE_API_SECRET".to_string(),
        }
    }
}

/// TWAP runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwapSettings {
    /// Stop at the first failed slice instead of carrying on
    pub abort_on_failure: bool,
    pub client_id_prefix: String,
}

impl Default for TwapSettings {
    fn default() -> Self {
        Self {
            abort_on_failure: false,
            client_id_prefix: "twap".to_string(),
        }
    }
}

/// Offline paper exchange settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSettings {
    pub wallet_balance: Decimal,
    pub slippage_pct: Decimal,
    /// Mark prices keyed by symbol
    pub mark_prices: HashMap<String, Decimal>,
}

impl Default for PaperSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            wallet_balance: dec!(10000),
            slippage_pct: Decimal::ZERO,
            mark_prices: HashMap::from([
                ("BTCUSDT".to_string(), dec!(50000)),
                ("ETHUSDT".to_string(), dec!(3000)),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.exchange.recv_window_ms = 90_000;
        assert_eq!(config.validate(), Err(SettingsError::RecvWindow(90_000)));

        let mut config = AppConfig::default();
        config.logging.format = "xml".into();
        assert!(matches!(config.validate(), Err(SettingsError::LogFormat(_))));

        let mut config = AppConfig::default();
        config.twap.client_id_prefix = "twap-run".into();
        assert!(matches!(config.validate(), Err(SettingsError::ClientIdPrefix(_))));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[exchange]"));
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.exchange.base_url, config.exchange.base_url);
        assert_eq!(parsed.paper.wallet_balance, config.paper.wallet_balance);
    }
}
