//! Goshippo shipment tracking client.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::TrackingConfig;

/// Goshippo API base URL.
const SHIPPO_API_BASE: &str = "https://api.goshippo.com";

/// Errors that can occur when looking up a shipment.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The HTTP request could not be performed.
    #[error("tracking request failed: {0}")]
    Request(String),

    /// The provider response could not be decoded.
    #[error("tracking response invalid: {0}")]
    Response(String),

    /// The carrier/number pair is not a trackable shipment.
    #[error("Tracking Info Invalid")]
    InvalidInfo,
}

/// Condensed tracking state returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSummary {
    /// Origin address as reported by the carrier.
    pub from_address: Value,
    /// Destination address as reported by the carrier.
    pub to_address: Value,
    /// Estimated delivery time, when the carrier provides one.
    pub eta: Option<String>,
    /// Current delivery status (e.g. `TRANSIT`, `DELIVERED`).
    pub status: String,
    /// Location of the most recent scan event.
    pub last_location: Value,
}

/// Shipment tracking provider.
#[allow(async_fn_in_trait)]
pub trait TrackingGateway {
    /// Look up the current state of a shipment.
    async fn lookup(
        &self,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<TrackingSummary, TrackingError>;
}

/// Goshippo implementation of [`TrackingGateway`].
#[derive(Clone)]
pub struct ShippoClient {
    client: Client,
    api_token: SecretString,
}

impl std::fmt::Debug for ShippoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippoClient")
            .field("api_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ShippoClient {
    /// Create a new client from the tracking provider configuration.
    #[must_use]
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            client: Client::new(),
            api_token: config.api_token.clone(),
        }
    }
}

impl TrackingGateway for ShippoClient {
    #[instrument(skip(self), fields(carrier = %carrier))]
    async fn lookup(
        &self,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<TrackingSummary, TrackingError> {
        let response = self
            .client
            .get(format!(
                "{SHIPPO_API_BASE}/tracks/{carrier}/{tracking_number}"
            ))
            .header(
                "Authorization",
                format!("ShippoToken {}", self.api_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| TrackingError::Request(e.to_string()))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| TrackingError::Response(e.to_string()))?;

        let summary = summarize_track(&json)?;

        debug!(status = %summary.status, "tracking lookup succeeded");

        Ok(summary)
    }
}

/// Condense a Goshippo track payload.
///
/// A response whose service level carries no token means the carrier did
/// not recognize the number; that maps to [`TrackingError::InvalidInfo`],
/// the same answer callers get for a ticket with no tracking on file.
fn summarize_track(json: &Value) -> Result<TrackingSummary, TrackingError> {
    if json["servicelevel"]["token"].is_null() {
        return Err(TrackingError::InvalidInfo);
    }

    let status = json["tracking_status"]["status"]
        .as_str()
        .ok_or_else(|| TrackingError::Response("tracking_status missing".to_string()))?
        .to_owned();

    Ok(TrackingSummary {
        from_address: json["address_from"].clone(),
        to_address: json["address_to"].clone(),
        eta: json["eta"].as_str().map(str::to_owned),
        status,
        last_location: json["tracking_history"][0]["location"].clone(),
    })
}
