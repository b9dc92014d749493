//! Ticket workflows: creation, mirrored updates, recency listing,
//! deletion, and shipment tracking.

use serde_json::json;

use shopdesk_core::{PaymentId, PhoneNumber, TicketId, parse_id_keys};
use shopdesk_store::{
    Customer, CustomerSnapshot, DocPath, DocumentStore, IdKind, PaymentField, Shipping,
    StoreFilter, Ticket, TicketField,
};

use crate::engine::{
    ConsistencyEngine, DeleteOutcome, NEW_STATUS, date_string, mirror, now_millis, partial_write,
    to_json,
};
use crate::error::EngineError;
use crate::gateway::tracking::{TrackingError, TrackingGateway, TrackingSummary};
use crate::validate::{check_identity, normalize_name};

/// Intake form for a new ticket.
#[derive(Debug, Clone, Default)]
pub struct NewTicketForm {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub issue: String,
    pub description: String,
}

impl<S: DocumentStore> ConsistencyEngine<S> {
    /// Create a ticket, synthesizing the customer record first when the
    /// phone number is not yet registered.
    ///
    /// A registered phone is an identity anchor: the submitted name must
    /// match the record on file or the call returns field errors with
    /// zero writes. The canonical ticket and the customer-embedded
    /// summary are written in one atomic update.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad phone or identity mismatch; `NotFound` for
    /// an unknown store.
    pub async fn create_ticket(
        &self,
        storename: &str,
        form: &NewTicketForm,
    ) -> Result<(TicketId, Ticket), EngineError> {
        let phone = PhoneNumber::parse(&form.phone)
            .map_err(|_| EngineError::field("phoneError", "Invalid phone number"))?;

        let doc = self.get_store(storename).await?;
        let filter = StoreFilter::storename(storename);

        let snapshot = CustomerSnapshot {
            firstname: normalize_name(&form.firstname),
            lastname: normalize_name(&form.lastname),
            phone: phone.as_str().to_owned(),
            email: form.email.trim().to_lowercase(),
        };

        let new_customer = match doc.customer(phone.as_str()) {
            Some(on_file) => {
                let errors = check_identity(on_file, &form.firstname, &form.lastname);
                if !errors.is_empty() {
                    return Err(EngineError::Validation(errors));
                }
                None
            }
            None => Some(Customer {
                firstname: snapshot.firstname.clone(),
                lastname: snapshot.lastname.clone(),
                phone: snapshot.phone.clone(),
                email: snapshot.email.clone(),
                tickets: std::collections::BTreeMap::new(),
                payments: std::collections::BTreeMap::new(),
                date_joined: date_string(),
            }),
        };

        let id = TicketId::new(self.store().allocate_id(&filter, IdKind::Ticket).await?);

        let ticket = Ticket {
            customer: snapshot,
            subject: form.subject.trim().to_owned(),
            issue: form.issue.clone(),
            description: form.description.trim().to_owned(),
            status: NEW_STATUS.to_owned(),
            shipping: Shipping::default(),
            payments: std::collections::BTreeMap::new(),
            last_updated: now_millis(),
            date_created: date_string(),
            sms_log: vec![],
        };

        let mut writes = Vec::with_capacity(3);
        if let Some(customer) = &new_customer {
            writes.push((DocPath::customer(phone.as_str()), to_json(customer)?));
        }
        writes.push((DocPath::ticket(id), to_json(&ticket)?));
        writes.push((
            DocPath::customer_ticket(phone.as_str(), id),
            to_json(&ticket.summary())?,
        ));

        self.store().set_fields(&filter, writes).await?;

        Ok((id, ticket))
    }

    /// Set a ticket's status in both copies, bumping `last_updated`
    /// identically. Returns the tickets sorted by recency.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or ticket.
    pub async fn update_ticket_status(
        &self,
        storename: &str,
        id: TicketId,
        status: &str,
    ) -> Result<Vec<(TicketId, Ticket)>, EngineError> {
        self.update_mirrored_with_bump(storename, id, TicketField::Status, json!(status))
            .await?;
        self.list_tickets_by_recency(storename).await
    }

    /// Set a ticket's issue category in both copies, bumping
    /// `last_updated` identically. Returns the tickets sorted by recency.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or ticket.
    pub async fn update_ticket_issue(
        &self,
        storename: &str,
        id: TicketId,
        issue: &str,
    ) -> Result<Vec<(TicketId, Ticket)>, EngineError> {
        self.update_mirrored_with_bump(storename, id, TicketField::Issue, json!(issue))
            .await?;
        self.list_tickets_by_recency(storename).await
    }

    /// Rewrite a ticket's subject and description in both copies. Does
    /// not touch `last_updated`; edits to the write-up are not activity.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or ticket.
    pub async fn update_ticket_info(
        &self,
        storename: &str,
        id: TicketId,
        subject: &str,
        description: &str,
    ) -> Result<(), EngineError> {
        let phone = self.phone_for_ticket(storename, id).await?;
        let writes = mirror::ticket_mirror_writes(
            &phone,
            id,
            &[
                (TicketField::Subject, json!(subject.trim())),
                (TicketField::Description, json!(description.trim())),
            ],
        );
        self.store()
            .set_fields(&StoreFilter::storename(storename), writes)
            .await?;
        Ok(())
    }

    /// Set a ticket's tracking number and carrier in both copies.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or ticket.
    pub async fn update_ticket_shipping(
        &self,
        storename: &str,
        id: TicketId,
        tracking: &str,
        carrier: &str,
    ) -> Result<(), EngineError> {
        let phone = self.phone_for_ticket(storename, id).await?;
        let writes = mirror::ticket_mirror_writes(
            &phone,
            id,
            &[
                (TicketField::ShippingTracking, json!(tracking)),
                (TicketField::ShippingCarrier, json!(carrier)),
            ],
        );
        self.store()
            .set_fields(&StoreFilter::storename(storename), writes)
            .await?;
        Ok(())
    }

    /// All tickets, most recently updated first. Equal timestamps order
    /// by ascending numeric ID, not by key string (where `"10000"` would
    /// sort before `"2000"`).
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn list_tickets_by_recency(
        &self,
        storename: &str,
    ) -> Result<Vec<(TicketId, Ticket)>, EngineError> {
        let doc = self.get_store(storename).await?;
        let mut tickets: Vec<(TicketId, Ticket)> = doc
            .tickets
            .into_iter()
            .filter_map(|(key, ticket)| key.parse::<TicketId>().ok().map(|id| (id, ticket)))
            .collect();
        tickets.sort_by(|a, b| {
            b.1.last_updated
                .cmp(&a.1.last_updated)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(tickets)
    }

    /// One canonical ticket.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or ticket.
    pub async fn get_ticket(&self, storename: &str, id: TicketId) -> Result<Ticket, EngineError> {
        let doc = self.get_store(storename).await?;
        doc.ticket(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("ticket", id.key()))
    }

    /// Phone key of the customer who owns a ticket.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or ticket.
    pub async fn phone_for_ticket(
        &self,
        storename: &str,
        id: TicketId,
    ) -> Result<String, EngineError> {
        Ok(self.get_ticket(storename, id).await?.customer.phone)
    }

    /// Remove a ticket from both its locations.
    ///
    /// Payments linked to the ticket survive: their `linkedTicket` field
    /// is cleared (canonical and customer mirror) before the ticket
    /// copies are unset, so no payment is ever orphaned onto a dead ID.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store; `PartialWrite` if the ticket
    /// removal fails after the links were already cleared.
    pub async fn delete_ticket(
        &self,
        storename: &str,
        id: TicketId,
    ) -> Result<DeleteOutcome, EngineError> {
        let doc = self.get_store(storename).await?;
        let Some(ticket) = doc.ticket(id) else {
            return Ok(DeleteOutcome::NotFound);
        };

        let filter = StoreFilter::storename(storename);
        let phone = ticket.customer.phone.clone();
        let linked: Vec<PaymentId> = parse_id_keys(ticket.payments.keys());

        let mut unlink = Vec::with_capacity(linked.len() * 2);
        for payment in &linked {
            unlink.push((
                DocPath::payment_field(*payment, PaymentField::LinkedTicket),
                json!(""),
            ));
            unlink.push((
                DocPath::customer_payment_field(&phone, *payment, PaymentField::LinkedTicket),
                json!(""),
            ));
        }

        let cleared_links = !unlink.is_empty();
        if cleared_links {
            self.store().set_fields(&filter, unlink).await?;
        }

        let removal = self
            .store()
            .unset_fields(
                &filter,
                vec![DocPath::ticket(id), DocPath::customer_ticket(&phone, id)],
            )
            .await;

        match removal {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(source) if cleared_links => Err(partial_write(
                "payment links cleared but ticket copies not removed",
            )(source)),
            Err(source) => Err(source.into()),
        }
    }

    /// Look up the current shipment state for a ticket's tracking number.
    ///
    /// # Errors
    ///
    /// `Tracking(InvalidInfo)` for an unknown ticket or one with no
    /// tracking number on file; gateway errors otherwise.
    pub async fn track_shipment(
        &self,
        gateway: &impl TrackingGateway,
        storename: &str,
        id: TicketId,
    ) -> Result<TrackingSummary, EngineError> {
        let doc = self.get_store(storename).await?;
        let shipping = doc
            .ticket(id)
            .map(|t| t.shipping.clone())
            .ok_or(TrackingError::InvalidInfo)?;

        if shipping.tracking.is_empty() {
            return Err(TrackingError::InvalidInfo.into());
        }

        Ok(gateway.lookup(&shipping.carrier, &shipping.tracking).await?)
    }

    async fn update_mirrored_with_bump(
        &self,
        storename: &str,
        id: TicketId,
        field: TicketField,
        value: serde_json::Value,
    ) -> Result<(), EngineError> {
        let phone = self.phone_for_ticket(storename, id).await?;
        let writes = mirror::ticket_mirror_writes(
            &phone,
            id,
            &[(field, value), (TicketField::LastUpdated, json!(now_millis()))],
        );
        self.store()
            .set_fields(&StoreFilter::storename(storename), writes)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use shopdesk_store::MemoryStore;

    use crate::engine::NewStoreForm;

    async fn engine_with_store() -> ConsistencyEngine<MemoryStore> {
        let engine = ConsistencyEngine::new(MemoryStore::new());
        engine
            .create_store(&NewStoreForm {
                storename: "acme".into(),
            })
            .await
            .unwrap();
        engine
    }

    fn form(phone: &str) -> NewTicketForm {
        NewTicketForm {
            firstname: " Jane ".into(),
            lastname: "Doe".into(),
            phone: phone.into(),
            email: "Jane@Example.com ".into(),
            subject: " Cracked screen ".into(),
            issue: "Repair".into(),
            description: "Front glass shattered".into(),
        }
    }

    #[tokio::test]
    async fn test_create_ticket_synthesizes_customer() {
        let engine = engine_with_store().await;

        let (id, ticket) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();
        assert_eq!(id, TicketId::new(2000));
        assert_eq!(ticket.status, "New");
        assert_eq!(ticket.subject, "Cracked screen");
        assert_eq!(ticket.customer.firstname, "jane");
        assert_eq!(ticket.customer.email, "jane@example.com");

        let doc = engine.get_store("acme").await.unwrap();
        let customer = doc.customer("5551234567").unwrap();
        assert_eq!(customer.lastname, "doe");
        // The embedded copy matches the canonical mutable fields.
        let mirrored = customer.tickets.get("2000").unwrap();
        assert_eq!(*mirrored, doc.ticket(id).unwrap().summary());
    }

    #[tokio::test]
    async fn test_create_ticket_invalid_phone_writes_nothing() {
        let engine = engine_with_store().await;

        let err = engine.create_ticket("acme", &form("not-a-phone")).await.unwrap_err();
        assert_eq!(
            err.as_field_errors().unwrap().get("phoneError"),
            Some("Invalid phone number")
        );

        let doc = engine.get_store("acme").await.unwrap();
        assert!(doc.tickets.is_empty());
        assert!(doc.customers.is_empty());
    }

    #[tokio::test]
    async fn test_create_ticket_identity_mismatch_halts() {
        let engine = engine_with_store().await;
        engine.create_ticket("acme", &form("5551234567")).await.unwrap();

        let mut second = form("5551234567");
        second.lastname = "Smith".into();
        let err = engine.create_ticket("acme", &second).await.unwrap_err();
        assert_eq!(
            err.as_field_errors().unwrap().get("lastnameError"),
            Some("Lastname doesnt match account on file")
        );

        let doc = engine.get_store("acme").await.unwrap();
        assert_eq!(doc.tickets.len(), 1);
    }

    #[tokio::test]
    async fn test_ticket_ids_are_sequential_from_floor() {
        let engine = engine_with_store().await;

        let (first, _) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();
        let (second, _) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();
        assert_eq!(first, TicketId::new(2000));
        assert_eq!(second, TicketId::new(2001));
    }

    #[tokio::test]
    async fn test_status_update_hits_both_copies_and_sorts_first() {
        let engine = engine_with_store().await;
        let (first, _) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();
        engine.create_ticket("acme", &form("5551234567")).await.unwrap();

        let sorted = engine
            .update_ticket_status("acme", first, "Resolved")
            .await
            .unwrap();
        assert_eq!(sorted[0].0, first);
        assert_eq!(sorted[0].1.status, "Resolved");

        let doc = engine.get_store("acme").await.unwrap();
        let canonical = doc.ticket(first).unwrap();
        let embedded = doc
            .customer("5551234567")
            .unwrap()
            .tickets
            .get(&first.key())
            .unwrap();
        assert_eq!(embedded.status, "Resolved");
        assert_eq!(embedded.last_updated, canonical.last_updated);
    }

    #[tokio::test]
    async fn test_info_update_does_not_bump_last_updated() {
        let engine = engine_with_store().await;
        let (id, ticket) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();

        engine
            .update_ticket_info("acme", id, "New subject", " Longer description ")
            .await
            .unwrap();

        let updated = engine.get_ticket("acme", id).await.unwrap();
        assert_eq!(updated.subject, "New subject");
        assert_eq!(updated.description, "Longer description");
        assert_eq!(updated.last_updated, ticket.last_updated);
    }

    #[tokio::test]
    async fn test_shipping_update_is_mirrored() {
        let engine = engine_with_store().await;
        let (id, _) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();

        engine
            .update_ticket_shipping("acme", id, "9400100000000000000000", "usps")
            .await
            .unwrap();

        let doc = engine.get_store("acme").await.unwrap();
        assert_eq!(doc.ticket(id).unwrap().shipping.carrier, "usps");
        assert_eq!(
            doc.customer("5551234567")
                .unwrap()
                .tickets
                .get(&id.key())
                .unwrap()
                .shipping
                .tracking,
            "9400100000000000000000"
        );
    }

    #[tokio::test]
    async fn test_delete_ticket_removes_both_copies() {
        let engine = engine_with_store().await;
        let (id, _) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();

        assert_eq!(
            engine.delete_ticket("acme", id).await.unwrap(),
            DeleteOutcome::Deleted
        );

        let doc = engine.get_store("acme").await.unwrap();
        assert!(doc.ticket(id).is_none());
        assert!(doc.customer("5551234567").unwrap().tickets.is_empty());

        // Repeat deletion is a distinguishable no-op, not an error.
        assert_eq!(
            engine.delete_ticket("acme", id).await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_deleted_ticket_id_is_never_reallocated() {
        let engine = engine_with_store().await;
        let (first, _) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();
        engine.delete_ticket("acme", first).await.unwrap();

        let (second, _) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();
        assert_eq!(second, TicketId::new(2001));
    }

    #[tokio::test]
    async fn test_recency_ties_order_by_numeric_id() {
        let engine = engine_with_store().await;
        let (id, ticket) = engine.create_ticket("acme", &form("5551234567")).await.unwrap();

        // Same last_updated under a five-digit ID, whose key string sorts
        // before "2000".
        let wide = TicketId::new(10000);
        engine
            .store()
            .set_fields(
                &StoreFilter::storename("acme"),
                vec![(DocPath::ticket(wide), serde_json::to_value(&ticket).unwrap())],
            )
            .await
            .unwrap();

        let ids: Vec<TicketId> = engine
            .list_tickets_by_recency("acme")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, [id, wide]);
    }
}
