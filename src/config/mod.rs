//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `AEGIS` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use aegis::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod relay;
mod server;
mod sweeper;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use relay::RelayConfig;
pub use server::{Environment, ServerConfig};
pub use sweeper::SweeperConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment processor and pricing
    pub payment: PaymentConfig,

    /// Relay presentation metadata
    #[serde(default)]
    pub relay: RelayConfig,

    /// Expiry sweeper
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `AEGIS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `AEGIS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `AEGIS__PAYMENT__PRICE_PER_YEAR=21000` -> `payment.price_per_year = 21000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("AEGIS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.relay.validate()?;
        self.sweeper.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "AEGIS__DATABASE__URL",
        "AEGIS__PAYMENT__API_KEY",
        "AEGIS__PAYMENT__WEBHOOK_SECRET",
        "AEGIS__PAYMENT__PRICE_PER_YEAR",
        "AEGIS__SERVER__PORT",
        "AEGIS__SERVER__ENVIRONMENT",
        "AEGIS__SWEEPER__RELOAD_GATE",
        "AEGIS__RELAY__NAME",
    ];

    fn set_minimal_env() {
        env::set_var("AEGIS__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("AEGIS__PAYMENT__API_KEY", "bitvora_key");
        env::set_var("AEGIS__PAYMENT__WEBHOOK_SECRET", "webhook_secret");
        env::set_var("AEGIS__PAYMENT__PRICE_PER_YEAR", "21000");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config loads");
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.payment.price_per_year, 21000.0);
        assert_eq!(config.payment.currency, "sats");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_section_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.sweeper.interval_secs, 3600);
        assert!(config.sweeper.reload_gate);
        assert!(config.relay.name.is_empty());
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("AEGIS__SERVER__PORT", "3000");
        env::set_var("AEGIS__SERVER__ENVIRONMENT", "production");
        env::set_var("AEGIS__SWEEPER__RELOAD_GATE", "false");
        env::set_var("AEGIS__RELAY__NAME", "Paid Relay");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert!(!config.sweeper.reload_gate);
        assert_eq!(config.relay.name, "Paid Relay");
    }

    #[test]
    fn test_missing_payment_section_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("AEGIS__DATABASE__URL", "postgresql://test@localhost/test");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
