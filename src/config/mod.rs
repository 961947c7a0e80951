mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable that overrides `telegram.bot_token`.
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./tubecast.toml",
        "~/.config/tubecast/config.toml",
        "/etc/tubecast/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env(&mut config);
    Ok(config)
}

/// Parse configuration from TOML text without touching the environment.
pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Overlay settings taken from the environment.
pub fn apply_env(config: &mut Config) {
    if let Some(token) = std::env::var(BOT_TOKEN_ENV)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
    {
        config.telegram.bot_token = Some(token);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.split.max_part_bytes == 0 {
        anyhow::bail!("split.max_part_bytes cannot be 0");
    }

    if config.split.transcode_timeout_secs == 0 {
        anyhow::bail!("split.transcode_timeout_secs cannot be 0");
    }

    if config.telegram.poll_timeout_secs == 0 {
        tracing::warn!("telegram.poll_timeout_secs is 0; the bot will busy-poll");
    }

    if config.telegram.bot_token.is_none() {
        tracing::warn!("No bot token configured; set {} or telegram.bot_token", BOT_TOKEN_ENV);
    }

    Ok(())
}
