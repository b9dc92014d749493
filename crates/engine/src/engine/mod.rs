//! The consistency engine and its operations.
//!
//! Operations are grouped by entity: [`tickets`], [`customers`],
//! [`payments`], [`search`], [`sms`], and [`settings`] each add an `impl`
//! block to [`ConsistencyEngine`]. Mirror-write construction lives in
//! [`mirror`] and is the only place that knows every location a record is
//! duplicated to.

pub mod customers;
pub mod mirror;
pub mod payments;
pub mod search;
pub mod settings;
pub mod sms;
pub mod tickets;

pub use customers::{ContactInfoUpdate, NewCustomerForm};
pub use payments::NewPaymentForm;
pub use search::SearchResults;
pub use settings::NewStoreForm;
pub use sms::InboundSms;
pub use tickets::NewTicketForm;

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use shopdesk_store::{DocumentStore, StoreDocument, StoreError, StoreFilter};

use crate::error::EngineError;

/// Ticket status applied when a customer replies by SMS.
pub const CUSTOMER_REPLY_STATUS: &str = "Customer Reply";

/// Ticket status applied at creation.
pub const NEW_STATUS: &str = "New";

/// Result of a deletion request.
///
/// Deleting a record that is already gone is not an error; callers that
/// care (double-submit detection, audit trails) can tell the cases apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record existed and was removed.
    Deleted,
    /// No record with that ID; nothing was written.
    NotFound,
}

/// Keeps every mirrored copy of a record in agreement with its canonical
/// form, one store document at a time.
#[derive(Debug, Clone)]
pub struct ConsistencyEngine<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ConsistencyEngine<S> {
    /// Create an engine over the given document store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying document store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the full document for a storename.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn get_store(&self, storename: &str) -> Result<StoreDocument, EngineError> {
        self.store
            .find_one(&StoreFilter::storename(storename))
            .await?
            .ok_or_else(|| EngineError::not_found("store", storename))
    }

}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}

/// Today rendered the way documents record creation dates
/// (e.g. `Mon Nov 13 2023`).
pub(crate) fn date_string() -> String {
    Local::now().format("%a %b %d %Y").to_string()
}

/// Serialize a record for a document write.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value)
        .map_err(|e| EngineError::Store(StoreError::Serialization(e)))
}

/// Error mapper for the later writes of a multi-call workflow. Logs and
/// wraps the failure so an operator can reconcile the half-applied state.
pub(crate) fn partial_write(context: &str) -> impl FnOnce(StoreError) -> EngineError + '_ {
    move |source| {
        error!(context, %source, "later write of a multi-call workflow failed");
        EngineError::PartialWrite {
            context: context.to_owned(),
            source,
        }
    }
}
