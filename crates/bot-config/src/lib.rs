//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, ExchangeSettings, LoggingConfig, PaperSettings, SettingsError,
    TwapSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Environment variable prefix, e.g. `FUTURES_BOT__EXCHANGE__RECV_WINDOW_MS`.
pub const ENV_PREFIX: &str = "FUTURES_BOT";

/// Load configuration from file and environment.
///
/// A missing file is an error only when `required` is set; otherwise the
/// built-in defaults apply.
pub fn load_config(path: &Path, required: bool) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}
