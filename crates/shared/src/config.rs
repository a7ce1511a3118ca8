//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Exchange-rate client configuration.
    pub exchange: ExchangeConfig,
}

/// Exchange-rate client configuration.
///
/// Currency normalization is best-effort: conversions that fail or exceed
/// the timeout leave the claim without a normalized value instead of
/// failing the submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Base URL of the exchange-rate API.
    #[serde(default = "default_exchange_url")]
    pub base_url: String,
    /// Per-conversion timeout in milliseconds.
    #[serde(default = "default_exchange_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_exchange_url() -> String {
    "https://api.exchangerate.host".to_string()
}

fn default_exchange_timeout_ms() -> u64 {
    3000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_url(),
            timeout_ms: default_exchange_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CLAIMFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
