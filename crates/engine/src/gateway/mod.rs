//! Outbound provider clients.
//!
//! Each provider sits behind a small trait so the engine can be exercised
//! with test doubles; the real implementations are thin `reqwest` clients
//! over the provider HTTP APIs.

pub mod sms;
pub mod tracking;

pub use sms::{SmsError, SmsGateway, TwilioSmsClient};
pub use tracking::{ShippoClient, TrackingError, TrackingGateway, TrackingSummary};
