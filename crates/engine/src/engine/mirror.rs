//! Mirror-write construction.
//!
//! The only module that knows every location a record is duplicated to.
//! Mutators build their write sets here and issue them as one atomic
//! `set_fields` call, so the canonical record and its mirrors cannot tear.

use serde_json::Value;

use shopdesk_core::{PaymentId, TicketId};
use shopdesk_store::{DocPath, Payment, TicketField};

/// Writes applying `fields` to both copies of a ticket: the canonical
/// record under `tickets` and the summary embedded under the owning
/// customer.
pub(crate) fn ticket_mirror_writes(
    phone: &str,
    id: TicketId,
    fields: &[(TicketField, Value)],
) -> Vec<(DocPath, Value)> {
    let mut writes = Vec::with_capacity(fields.len() * 2);
    for (field, value) in fields {
        writes.push((DocPath::ticket_field(id, *field), value.clone()));
        writes.push((
            DocPath::customer_ticket_field(phone, id, *field),
            value.clone(),
        ));
    }
    writes
}

/// Every location the given payment record lives at: the canonical record,
/// the owning customer's mirror (when the payment carries a phone), and
/// the linked ticket's mirror (when one is linked).
pub(crate) fn payment_locations(payment: &Payment, id: PaymentId) -> Vec<DocPath> {
    let mut paths = vec![DocPath::payment(id)];
    if !payment.customer.phone.is_empty() {
        paths.push(DocPath::customer_payment(&payment.customer.phone, id));
    }
    if let Some(ticket) = payment.linked_ticket.get() {
        paths.push(DocPath::ticket_payment(ticket, id));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use shopdesk_core::LinkedTicket;
    use shopdesk_store::CustomerSnapshot;

    fn payment(phone: &str, linked: LinkedTicket) -> Payment {
        Payment {
            customer: CustomerSnapshot {
                firstname: "jane".into(),
                lastname: "doe".into(),
                phone: phone.into(),
                email: "jane@example.com".into(),
            },
            order_total: rust_decimal::Decimal::new(1000, 2),
            order_items: json!([]),
            payment_method: "card".into(),
            linked_ticket: linked,
            status: "approved".into(),
            date: "Mon Nov 13 2023".into(),
        }
    }

    #[test]
    fn test_ticket_mirror_writes_cover_both_copies() {
        let writes = ticket_mirror_writes(
            "5551234567",
            TicketId::new(2001),
            &[
                (TicketField::Status, json!("Resolved")),
                (TicketField::LastUpdated, json!(42)),
            ],
        );

        assert_eq!(writes.len(), 4);
        let rendered: Vec<String> = writes.iter().map(|(p, _)| p.to_string()).collect();
        assert!(rendered.contains(&"tickets.2001.status".to_string()));
        assert!(rendered.contains(&"customers.5551234567.tickets.2001.status".to_string()));
        assert!(rendered.contains(&"tickets.2001.lastUpdated".to_string()));
        assert!(rendered.contains(&"customers.5551234567.tickets.2001.lastUpdated".to_string()));

        // Both copies of a field receive the same value.
        assert_eq!(writes[0].1, writes[1].1);
    }

    #[test]
    fn test_payment_locations_full_fanout() {
        let paths = payment_locations(
            &payment("5551234567", LinkedTicket::to(TicketId::new(2001))),
            PaymentId::new(100),
        );
        let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "payments.100",
                "customers.5551234567.payments.100",
                "tickets.2001.payments.100"
            ]
        );
    }

    #[test]
    fn test_payment_locations_walk_in_unlinked() {
        // Anonymous unlinked payment lives only at the canonical location.
        let paths = payment_locations(&payment("", LinkedTicket::none()), PaymentId::new(99));
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].to_string(), "payments.99");
    }
}
