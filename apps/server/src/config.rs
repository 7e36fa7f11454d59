//! Application configuration from environment variables.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
}

/// Runtime configuration.
///
/// Everything except the bot token has a default; a missing token is the
/// one error that stops the process from starting at all.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot credential.
    pub telegram_bot_token: String,
    /// Provider keys to aggregate, in priority order.
    pub enabled_providers: Vec<String>,
    /// Alert check interval in minutes.
    pub alert_check_minutes: u64,
    /// Default report size for /rates.
    pub default_top_n: usize,
    /// Binance Simple Earn credentials, when configured.
    pub binance_credentials: Option<(String, String)>,
}

impl AppConfig {
    /// Read configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function (testable without
    /// mutating the process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let enabled_providers =
            parse_provider_list(&lookup("ENABLED_PROVIDERS").unwrap_or_default());

        let alert_check_minutes = lookup("ALERT_CHECK_MINUTES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(10);

        let default_top_n = lookup("DEFAULT_TOP_N")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(15);

        let binance_credentials = match (
            lookup("BINANCE_API_KEY").filter(|k| !k.is_empty()),
            lookup("BINANCE_API_SECRET").filter(|s| !s.is_empty()),
        ) {
            (Some(key), Some(secret)) => Some((key, secret)),
            _ => None,
        };

        Ok(Self {
            telegram_bot_token,
            enabled_providers,
            alert_check_minutes,
            default_top_n,
            binance_credentials,
        })
    }
}

/// Split a comma-separated provider list; empty input falls back to the
/// default single provider.
fn parse_provider_list(value: &str) -> Vec<String> {
    let keys: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();
    if keys.is_empty() {
        vec!["defillama".to_string()]
    } else {
        keys
    }
}
