//! Partial-write reporting when a later call of a multi-call workflow
//! fails after an earlier one succeeded.
//!
//! These run against a store whose primitives are switched to fail
//! mid-workflow; the assertions check both the error shape and the
//! state the failure left behind.

use shopdesk_engine::EngineError;
use shopdesk_engine::engine::ContactInfoUpdate;
use shopdesk_integration_tests::{AcceptingSms, STORE, faulty_engine, payment_form, ticket_form};

#[tokio::test]
async fn failed_ticket_removal_after_link_clear_is_a_partial_write() {
    let engine = faulty_engine().await;
    let (ticket, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();
    let (payment, _) = engine
        .create_payment(STORE, &payment_form("5551234567", &ticket.key()))
        .await
        .unwrap();

    engine.store().fail_unset_fields();
    let err = engine.delete_ticket(STORE, ticket).await.unwrap_err();
    let EngineError::PartialWrite { context, .. } = err else {
        panic!("expected PartialWrite, got {err:?}");
    };
    assert!(context.contains("links cleared"), "context: {context}");

    // The link-clear landed before the failure; the ticket copies remain.
    let doc = engine.get_store(STORE).await.unwrap();
    assert!(!doc.payment(payment).unwrap().linked_ticket.is_linked());
    assert!(doc.ticket(ticket).is_some());
}

#[tokio::test]
async fn failed_removal_without_prior_writes_is_a_plain_store_error() {
    let engine = faulty_engine().await;
    let (ticket, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();

    // No linked payments, so no write precedes the failing removal.
    engine.store().fail_unset_fields();
    let err = engine.delete_ticket(STORE, ticket).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(_)), "got {err:?}");
}

#[tokio::test]
async fn failed_snapshot_rewrite_after_rename_is_a_partial_write() {
    let engine = faulty_engine().await;
    engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();

    engine.store().fail_set_fields();
    let err = engine
        .update_customer_contact_info(
            STORE,
            &ContactInfoUpdate {
                firstname: "Janet".into(),
                lastname: "Doe".into(),
                old_phone: "5551234567".into(),
                new_phone: "5559999999".into(),
                email: "janet@example.com".into(),
            },
        )
        .await
        .unwrap_err();
    let EngineError::PartialWrite { context, .. } = err else {
        panic!("expected PartialWrite, got {err:?}");
    };
    assert!(context.contains("renamed"), "context: {context}");

    // The key rename landed before the failure.
    let doc = engine.get_store(STORE).await.unwrap();
    assert!(doc.customer("5551234567").is_none());
    assert!(doc.customer("5559999999").is_some());
}

#[tokio::test]
async fn failed_transcript_append_after_send_is_a_partial_write() {
    let engine = faulty_engine().await;
    let (ticket, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();

    engine.store().fail_append();
    let err = engine
        .send_sms(&AcceptingSms, STORE, ticket, "5551234567", "on its way")
        .await
        .unwrap_err();
    let EngineError::PartialWrite { context, .. } = err else {
        panic!("expected PartialWrite, got {err:?}");
    };
    assert!(context.contains("sent"), "context: {context}");
}
