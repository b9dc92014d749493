//! Customer workflows: creation, lookups, and the contact-info rename
//! with snapshot fan-out.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use shopdesk_core::{Email, PaymentId, PhoneNumber, TicketId, parse_id_keys};
use shopdesk_store::{Customer, CustomerField, DocPath, DocumentStore, StoreFilter};

use crate::engine::{ConsistencyEngine, date_string, partial_write, to_json};
use crate::error::EngineError;
use crate::validate::normalize_name;

/// Intake form for an explicit customer registration.
#[derive(Debug, Clone, Default)]
pub struct NewCustomerForm {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: String,
}

/// Contact-info change request. `old_phone` identifies the record;
/// empty `new_phone` keeps the current key.
#[derive(Debug, Clone, Default)]
pub struct ContactInfoUpdate {
    pub firstname: String,
    pub lastname: String,
    pub old_phone: String,
    pub new_phone: String,
    pub email: String,
}

impl<S: DocumentStore> ConsistencyEngine<S> {
    /// Register a customer under their phone number.
    ///
    /// # Errors
    ///
    /// `Validation` with `phoneError` for a bad or already-registered
    /// phone; `NotFound` for an unknown store.
    pub async fn create_customer(
        &self,
        storename: &str,
        form: &NewCustomerForm,
    ) -> Result<Customer, EngineError> {
        let phone = PhoneNumber::parse(&form.phone)
            .map_err(|_| EngineError::field("phoneError", "Invalid phone number"))?;

        let doc = self.get_store(storename).await?;
        if doc.customer(phone.as_str()).is_some() {
            return Err(EngineError::field("phoneError", "Customer already in system"));
        }

        let customer = Customer {
            firstname: normalize_name(&form.firstname),
            lastname: normalize_name(&form.lastname),
            phone: phone.as_str().to_owned(),
            email: form.email.trim().to_lowercase(),
            tickets: BTreeMap::new(),
            payments: BTreeMap::new(),
            date_joined: date_string(),
        };

        self.store()
            .set_fields(
                &StoreFilter::storename(storename),
                vec![(DocPath::customer(phone.as_str()), to_json(&customer)?)],
            )
            .await?;

        Ok(customer)
    }

    /// One customer record by phone key.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or phone.
    pub async fn get_customer(
        &self,
        storename: &str,
        phone: &str,
    ) -> Result<Customer, EngineError> {
        let doc = self.get_store(storename).await?;
        doc.customer(phone)
            .cloned()
            .ok_or_else(|| EngineError::not_found("customer", phone))
    }

    /// All customers with their phone keys, sorted by firstname.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn list_customers_by_firstname(
        &self,
        storename: &str,
    ) -> Result<Vec<(String, Customer)>, EngineError> {
        let doc = self.get_store(storename).await?;
        let mut customers: Vec<(String, Customer)> = doc.customers.into_iter().collect();
        customers.sort_by(|a, b| a.1.firstname.cmp(&b.1.firstname));
        Ok(customers)
    }

    /// Update a customer's identity fields, renaming their map key when
    /// the phone number changes.
    ///
    /// The new identity is fanned out to every snapshot taken from this
    /// customer: the canonical tickets, the canonical payments, and the
    /// payment mirrors under the customer and any linked tickets. Returns
    /// the phone key the customer now lives under.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad phone/email or a phone already registered
    /// to another customer (no mutation in any of these cases);
    /// `NotFound` for an unknown store or customer; `PartialWrite` if the
    /// snapshot rewrite fails after the key rename already happened.
    pub async fn update_customer_contact_info(
        &self,
        storename: &str,
        update: &ContactInfoUpdate,
    ) -> Result<String, EngineError> {
        let firstname = normalize_name(&update.firstname);
        let lastname = normalize_name(&update.lastname);
        let new_phone = update.new_phone.trim().to_owned();
        let old_phone: String = update
            .old_phone
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let email = update.email.trim().to_lowercase();

        if !new_phone.is_empty() {
            PhoneNumber::parse(&new_phone)
                .map_err(|_| EngineError::field("phoneError", "Not a valid phone number"))?;
        }
        if !email.is_empty() {
            Email::parse(&email)
                .map_err(|_| EngineError::field("emailError", "Not a valid email"))?;
        }

        let doc = self.get_store(storename).await?;
        let customer = doc
            .customer(&old_phone)
            .cloned()
            .ok_or_else(|| EngineError::not_found("customer", &old_phone))?;

        let renaming = !new_phone.is_empty() && new_phone != old_phone;
        if renaming && doc.customers.contains_key(&new_phone) {
            return Err(EngineError::field("phoneError", "Phone already in system"));
        }

        let target = if renaming {
            new_phone
        } else {
            old_phone.clone()
        };

        let filter = StoreFilter::storename(storename);
        if renaming {
            self.store()
                .rename_field(
                    &filter,
                    &DocPath::customer(&old_phone),
                    &DocPath::customer(&target),
                )
                .await?;
        }

        let identity = |field: CustomerField| -> Value {
            match field {
                CustomerField::Firstname => json!(firstname),
                CustomerField::Lastname => json!(lastname),
                CustomerField::Phone => json!(target),
                CustomerField::Email => json!(email),
            }
        };

        let mut writes: Vec<(DocPath, Value)> = CustomerField::ALL
            .into_iter()
            .map(|f| (DocPath::customer_field(&target, f), identity(f)))
            .collect();

        let tickets: Vec<TicketId> = parse_id_keys(customer.tickets.keys());
        for ticket in tickets {
            for field in CustomerField::ALL {
                writes.push((DocPath::ticket_snapshot_field(ticket, field), identity(field)));
            }
        }

        for (key, payment) in &customer.payments {
            let Ok(id) = key.parse::<PaymentId>() else {
                continue;
            };
            for field in CustomerField::ALL {
                writes.push((DocPath::payment_snapshot_field(id, field), identity(field)));
                writes.push((
                    DocPath::customer_payment_snapshot_field(&target, id, field),
                    identity(field),
                ));
                if let Some(ticket) = payment.linked_ticket.get() {
                    writes.push((
                        DocPath::ticket_payment_snapshot_field(ticket, id, field),
                        identity(field),
                    ));
                }
            }
        }

        let rewrite = self.store().set_fields(&filter, writes).await;
        match rewrite {
            Ok(()) => Ok(target),
            Err(source) if renaming => Err(partial_write(
                "customer key renamed but snapshot rewrite failed",
            )(source)),
            Err(source) => Err(source.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use shopdesk_store::MemoryStore;

    use crate::engine::{NewStoreForm, NewTicketForm};

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

    fn customer_form(phone: &str) -> NewCustomerForm {
        NewCustomerForm {
            firstname: "Jane".into(),
            lastname: "Doe".into(),
            phone: phone.into(),
            email: "jane@example.com".into(),
        }
    }

    fn ticket_form(phone: &str) -> NewTicketForm {
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

    #[tokio::test]
    async fn test_create_customer_normalizes_identity() {
        let engine = engine_with_store().await;

        let customer = engine
            .create_customer(
                "acme",
                &NewCustomerForm {
                    firstname: " JANE ".into(),
                    lastname: "Doe".into(),
                    phone: "5551234567".into(),
                    email: " Jane@Example.COM".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(customer.firstname, "jane");
        assert_eq!(customer.email, "jane@example.com");
        assert!(customer.tickets.is_empty());
    }

    #[tokio::test]
    async fn test_create_customer_rejects_duplicate_phone() {
        let engine = engine_with_store().await;
        engine.create_customer("acme", &customer_form("5551234567")).await.unwrap();

        let err = engine
            .create_customer("acme", &customer_form("5551234567"))
            .await
            .unwrap_err();
        assert_eq!(
            err.as_field_errors().unwrap().get("phoneError"),
            Some("Customer already in system")
        );
    }

    #[tokio::test]
    async fn test_contact_update_collision_leaves_state_untouched() {
        let engine = engine_with_store().await;
        engine.create_customer("acme", &customer_form("5551234567")).await.unwrap();
        engine.create_customer("acme", &customer_form("5559999999")).await.unwrap();

        let err = engine
            .update_customer_contact_info(
                "acme",
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
        assert_eq!(
            err.as_field_errors().unwrap().get("phoneError"),
            Some("Phone already in system")
        );

        let unchanged = engine.get_customer("acme", "5551234567").await.unwrap();
        assert_eq!(unchanged.firstname, "jane");
    }

    #[tokio::test]
    async fn test_contact_update_renames_key_and_rewrites_snapshots() {
        let engine = engine_with_store().await;
        let (id, _) = engine.create_ticket("acme", &ticket_form("5551234567")).await.unwrap();

        let key = engine
            .update_customer_contact_info(
                "acme",
                &ContactInfoUpdate {
                    firstname: "Janet".into(),
                    lastname: "Doe".into(),
                    old_phone: "(555) 123-4567".into(),
                    new_phone: "5550001111".into(),
                    email: "janet@example.com".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(key, "5550001111");

        let doc = engine.get_store("acme").await.unwrap();
        assert!(doc.customer("5551234567").is_none());

        let moved = doc.customer("5550001111").unwrap();
        assert_eq!(moved.firstname, "janet");
        assert_eq!(moved.phone, "5550001111");
        // The embedded ticket copy moved with the record.
        assert!(moved.tickets.contains_key(&id.key()));

        // The canonical ticket's snapshot reflects the new identity.
        let snapshot = &doc.ticket(id).unwrap().customer;
        assert_eq!(snapshot.firstname, "janet");
        assert_eq!(snapshot.phone, "5550001111");
        assert_eq!(snapshot.email, "janet@example.com");
    }

    #[tokio::test]
    async fn test_contact_update_empty_phone_keeps_key() {
        let engine = engine_with_store().await;
        engine.create_customer("acme", &customer_form("5551234567")).await.unwrap();

        let key = engine
            .update_customer_contact_info(
                "acme",
                &ContactInfoUpdate {
                    firstname: "Janet".into(),
                    lastname: "Doe".into(),
                    old_phone: "5551234567".into(),
                    new_phone: String::new(),
                    email: "jane@example.com".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(key, "5551234567");

        let customer = engine.get_customer("acme", "5551234567").await.unwrap();
        assert_eq!(customer.firstname, "janet");
        assert_eq!(customer.phone, "5551234567");
    }

    #[tokio::test]
    async fn test_contact_update_invalid_email_halts() {
        let engine = engine_with_store().await;
        engine.create_customer("acme", &customer_form("5551234567")).await.unwrap();

        let err = engine
            .update_customer_contact_info(
                "acme",
                &ContactInfoUpdate {
                    firstname: "Jane".into(),
                    lastname: "Doe".into(),
                    old_phone: "5551234567".into(),
                    new_phone: String::new(),
                    email: "not-an-email".into(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.as_field_errors().unwrap().get("emailError"),
            Some("Not a valid email")
        );
    }

    #[tokio::test]
    async fn test_list_customers_sorted_by_firstname() {
        let engine = engine_with_store().await;
        let mut zoe = customer_form("5550000001");
        zoe.firstname = "Zoe".into();
        let mut amy = customer_form("5550000002");
        amy.firstname = "Amy".into();
        engine.create_customer("acme", &zoe).await.unwrap();
        engine.create_customer("acme", &amy).await.unwrap();

        let listed = engine.list_customers_by_firstname("acme").await.unwrap();
        assert_eq!(listed[0].1.firstname, "amy");
        assert_eq!(listed[1].1.firstname, "zoe");
    }
}
