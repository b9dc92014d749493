//! Unified error handling for the consistency engine.

use thiserror::Error;

use shopdesk_store::StoreError;

use crate::gateway::sms::SmsError;
use crate::gateway::tracking::TrackingError;
use crate::validate::FieldErrors;

/// Engine-level error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Pre-write validation failed. Carries the field-keyed messages for
    /// form redisplay; no mutation was performed.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Operation addressed an unknown store, customer, ticket, or payment.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind ("store", "customer", "ticket", "payment").
        entity: &'static str,
        /// The key that missed.
        key: String,
    },

    /// A later write of a multi-call workflow failed after an earlier one
    /// succeeded. There is no automatic rollback; the context names the
    /// writes so an operator can reconcile.
    #[error("partial write ({context}): {source}")]
    PartialWrite {
        context: String,
        source: StoreError,
    },

    /// Document store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// SMS provider failure. Local state is never corrupted by these.
    #[error("sms gateway error: {0}")]
    Sms(#[from] SmsError),

    /// Shipment tracking provider failure.
    #[error("tracking gateway error: {0}")]
    Tracking(#[from] TrackingError),
}

impl EngineError {
    /// Validation error with a single field message.
    #[must_use]
    pub fn field(name: &str, message: &str) -> Self {
        Self::Validation(FieldErrors::single(name, message))
    }

    /// Not-found error for the given entity kind and key.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// The field errors, when this is a validation failure.
    #[must_use]
    pub const fn as_field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
