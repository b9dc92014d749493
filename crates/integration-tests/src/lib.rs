//! Integration tests for Shopdesk.
//!
//! The suites in `tests/` drive a [`ConsistencyEngine`] over an in-memory
//! document store and assert on the raw document afterwards, so every
//! mirror location is checked against the canonical record. Gateway
//! traits are satisfied by the fakes in this crate; no network access is
//! required.
//!
//! Run with: `cargo test -p shopdesk-integration-tests`
//!
//! [`ConsistencyEngine`]: shopdesk_engine::ConsistencyEngine

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use shopdesk_engine::ConsistencyEngine;
use shopdesk_engine::engine::{NewPaymentForm, NewStoreForm, NewTicketForm};
use shopdesk_engine::gateway::sms::{SmsError, SmsGateway};
use shopdesk_engine::gateway::tracking::{TrackingError, TrackingGateway, TrackingSummary};
use shopdesk_store::{
    ArrayMatcher, DocPath, DocumentStore, IdKind, MemoryStore, SmsAccount, StoreDocument,
    StoreError, StoreFilter,
};

/// Storename every suite works against.
pub const STORE: &str = "acme";

/// SMS sub-account SID attached to the test store.
pub const SMS_SID: &str = "AC00000000000000000000000000000000";

/// An engine with one registered store and SMS credentials attached.
///
/// Engine log output is available via `RUST_LOG`, e.g.
/// `RUST_LOG=shopdesk_engine=debug cargo test -p shopdesk-integration-tests`.
pub async fn test_engine() -> ConsistencyEngine<MemoryStore> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let engine = ConsistencyEngine::new(MemoryStore::new());
    engine
        .create_store(&NewStoreForm {
            storename: STORE.into(),
        })
        .await
        .expect("store registration");
    engine
        .set_sms_account(
            STORE,
            &SmsAccount {
                sid: SMS_SID.into(),
                auth_token: "test-token".into(),
            },
        )
        .await
        .expect("sms account");
    engine
}

/// A ticket intake form for the given phone, identity "jane doe".
#[must_use]
pub fn ticket_form(phone: &str) -> NewTicketForm {
    NewTicketForm {
        firstname: "Jane".into(),
        lastname: "Doe".into(),
        phone: phone.into(),
        email: "jane@example.com".into(),
        subject: "Cracked screen".into(),
        issue: "Repair".into(),
        description: "Front glass shattered".into(),
    }
}

/// A payment form for the given phone and linked-ticket field.
#[must_use]
pub fn payment_form(phone: &str, linked_ticket: &str) -> NewPaymentForm {
    NewPaymentForm {
        customer: format!(
            r#"{{"firstname":"jane","lastname":"doe","phone":"{phone}","email":"jane@example.com"}}"#
        ),
        order: r#"[{"item":"screen replacement","price":"49.99"}]"#.into(),
        order_total: "49.99".into(),
        payment_method: "card".into(),
        linked_ticket: linked_ticket.into(),
    }
}

/// Store wrapper whose mutating primitives can be switched to fail,
/// for exercising the partial-write reporting of multi-call workflows
/// after their earlier calls succeeded.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_set_fields: AtomicBool,
    fail_unset_fields: AtomicBool,
    fail_append: AtomicBool,
}

impl FaultyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `set_fields` call from now on fails.
    pub fn fail_set_fields(&self) {
        self.fail_set_fields.store(true, Ordering::SeqCst);
    }

    /// Every `unset_fields` call from now on fails.
    pub fn fail_unset_fields(&self) {
        self.fail_unset_fields.store(true, Ordering::SeqCst);
    }

    /// Every `append_to_array` call from now on fails.
    pub fn fail_append(&self) {
        self.fail_append.store(true, Ordering::SeqCst);
    }

    fn fault(primitive: &str) -> StoreError {
        StoreError::PathConflict {
            path: primitive.to_owned(),
        }
    }
}

impl DocumentStore for FaultyStore {
    async fn insert(&self, doc: StoreDocument) -> Result<(), StoreError> {
        self.inner.insert(doc).await
    }

    async fn find_one(&self, filter: &StoreFilter) -> Result<Option<StoreDocument>, StoreError> {
        self.inner.find_one(filter).await
    }

    async fn find_raw(&self, filter: &StoreFilter) -> Result<Option<Value>, StoreError> {
        self.inner.find_raw(filter).await
    }

    async fn set_fields(
        &self,
        filter: &StoreFilter,
        writes: Vec<(DocPath, Value)>,
    ) -> Result<(), StoreError> {
        if self.fail_set_fields.load(Ordering::SeqCst) {
            return Err(Self::fault("set_fields"));
        }
        self.inner.set_fields(filter, writes).await
    }

    async fn unset_fields(
        &self,
        filter: &StoreFilter,
        paths: Vec<DocPath>,
    ) -> Result<(), StoreError> {
        if self.fail_unset_fields.load(Ordering::SeqCst) {
            return Err(Self::fault("unset_fields"));
        }
        self.inner.unset_fields(filter, paths).await
    }

    async fn rename_field(
        &self,
        filter: &StoreFilter,
        from: &DocPath,
        to: &DocPath,
    ) -> Result<(), StoreError> {
        self.inner.rename_field(filter, from, to).await
    }

    async fn append_to_array(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        item: Value,
    ) -> Result<(), StoreError> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(Self::fault("append_to_array"));
        }
        self.inner.append_to_array(filter, path, item).await
    }

    async fn remove_from_array(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        matcher: &ArrayMatcher,
    ) -> Result<(), StoreError> {
        self.inner.remove_from_array(filter, path, matcher).await
    }

    async fn add_unique(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        item: Value,
    ) -> Result<(), StoreError> {
        self.inner.add_unique(filter, path, item).await
    }

    async fn allocate_id(&self, filter: &StoreFilter, kind: IdKind) -> Result<u32, StoreError> {
        self.inner.allocate_id(filter, kind).await
    }
}

/// Like [`test_engine`], but over a [`FaultyStore`] still in its
/// all-success state.
pub async fn faulty_engine() -> ConsistencyEngine<FaultyStore> {
    let engine = ConsistencyEngine::new(FaultyStore::new());
    engine
        .create_store(&NewStoreForm {
            storename: STORE.into(),
        })
        .await
        .expect("store registration");
    engine
}

/// SMS gateway fake that accepts every message verbatim.
pub struct AcceptingSms;

impl SmsGateway for AcceptingSms {
    async fn send(
        &self,
        _account: &SmsAccount,
        _to_phone: &str,
        body: &str,
    ) -> Result<String, SmsError> {
        Ok(body.to_owned())
    }
}

/// Tracking gateway fake returning a fixed in-transit summary.
pub struct FixedTracking;

impl TrackingGateway for FixedTracking {
    async fn lookup(
        &self,
        _carrier: &str,
        tracking_number: &str,
    ) -> Result<TrackingSummary, TrackingError> {
        if tracking_number == "invalid" {
            return Err(TrackingError::InvalidInfo);
        }
        Ok(TrackingSummary {
            from_address: serde_json::json!({"city": "Las Vegas", "state": "NV"}),
            to_address: serde_json::json!({"city": "Spotsylvania", "state": "VA"}),
            eta: Some("2026-09-03T00:00:00Z".into()),
            status: "TRANSIT".into(),
            last_location: serde_json::json!({"city": "Elko", "state": "NV"}),
        })
    }
}
