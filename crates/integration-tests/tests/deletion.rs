//! Deletion workflows: tickets unlink their payments, payments scrub
//! every mirror, and IDs are never reused.

use shopdesk_core::TicketId;
use shopdesk_engine::DeleteOutcome;
use shopdesk_integration_tests::{STORE, payment_form, test_engine, ticket_form};

#[tokio::test]
async fn deleting_a_ticket_clears_links_on_both_payment_copies() {
    let engine = test_engine().await;
    let (ticket, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();
    let (first, _) = engine
        .create_payment(STORE, &payment_form("5551234567", &ticket.key()))
        .await
        .unwrap();
    let (second, _) = engine
        .create_payment(STORE, &payment_form("5551234567", &ticket.key()))
        .await
        .unwrap();

    assert_eq!(
        engine.delete_ticket(STORE, ticket).await.unwrap(),
        DeleteOutcome::Deleted
    );

    let doc = engine.get_store(STORE).await.unwrap();
    // Both ticket copies are gone.
    assert!(doc.ticket(ticket).is_none());
    assert!(doc.customer("5551234567").unwrap().tickets.is_empty());

    // The payments survive with their links cleared, in both locations.
    let customer = doc.customer("5551234567").unwrap();
    for id in [first, second] {
        assert!(!doc.payment(id).unwrap().linked_ticket.is_linked());
        assert!(
            !customer
                .payments
                .get(&id.key())
                .unwrap()
                .linked_ticket
                .is_linked()
        );
    }
}

#[tokio::test]
async fn repeated_ticket_deletion_is_a_distinguishable_no_op() {
    let engine = test_engine().await;
    let (ticket, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();

    assert_eq!(
        engine.delete_ticket(STORE, ticket).await.unwrap(),
        DeleteOutcome::Deleted
    );
    assert_eq!(
        engine.delete_ticket(STORE, ticket).await.unwrap(),
        DeleteOutcome::NotFound
    );
    assert_eq!(
        engine.delete_ticket(STORE, TicketId::new(9999)).await.unwrap(),
        DeleteOutcome::NotFound
    );
}

#[tokio::test]
async fn deleting_a_payment_removes_it_from_every_location() {
    let engine = test_engine().await;
    let (ticket, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();
    let (id, _) = engine
        .create_payment(STORE, &payment_form("5551234567", &ticket.key()))
        .await
        .unwrap();

    assert_eq!(
        engine.delete_payment(STORE, id).await.unwrap(),
        DeleteOutcome::Deleted
    );

    let doc = engine.get_store(STORE).await.unwrap();
    assert!(doc.payment(id).is_none());
    assert!(doc.customer("5551234567").unwrap().payments.is_empty());
    assert!(doc.ticket(ticket).unwrap().payments.is_empty());
}

#[tokio::test]
async fn ids_are_never_reused_after_deletion() {
    let engine = test_engine().await;
    let (first, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();
    engine.delete_ticket(STORE, first).await.unwrap();

    // Even with the collection empty again, the allocator moves forward.
    let (second, _) = engine.create_ticket(STORE, &ticket_form("5551234567")).await.unwrap();
    assert_eq!(first, TicketId::new(2000));
    assert_eq!(second, TicketId::new(2001));

    let (payment, _) = engine.create_payment(STORE, &payment_form("", "")).await.unwrap();
    engine.delete_payment(STORE, payment).await.unwrap();
    let (next, _) = engine.create_payment(STORE, &payment_form("", "")).await.unwrap();
    assert_eq!(next.as_u32(), payment.as_u32() + 1);
}
