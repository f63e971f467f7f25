//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid store operation timeout")]
    InvalidOperationTimeout,

    #[error("Price per year must be a positive number")]
    InvalidPrice,

    #[error("Invalid payment API base URL")]
    InvalidPaymentApiUrl,

    #[error("Invoice expiry must be positive")]
    InvalidInvoiceExpiry,

    #[error("Relay pubkey must be 64 hex characters")]
    InvalidRelayPubkey,

    #[error("Sweep interval must be positive")]
    InvalidSweepInterval,
}
