//! Validate configuration command.

use anyhow::{Context, Result};
use bot_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: &Path, config: &AppConfig) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    print!("{}", config.to_toml().context("Failed to render configuration")?);
    Ok(())
}
