//! Gateway configuration loaded from environment variables.
//!
//! Twilio credentials live per-store inside each store's document, so only
//! the shared providers are configured here.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHIPPO_API_TOKEN` - Goshippo API token for shipment tracking

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Configuration for the outbound gateways.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Shipment tracking provider.
    pub tracking: TrackingConfig,
}

/// Goshippo configuration.
#[derive(Clone)]
pub struct TrackingConfig {
    /// API token sent in the `ShippoToken` authorization header.
    pub api_token: SecretString,
}

impl std::fmt::Debug for TrackingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingConfig")
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            tracking: TrackingConfig {
                api_token: get_required_secret("SHIPPO_API_TOKEN")?,
            },
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}
