//! Payment workflows: creation with mirror fan-out, lookups, deletion.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use shopdesk_core::{LinkedTicket, PaymentId, PhoneNumber};
use shopdesk_store::{
    CustomerSnapshot, DocPath, DocumentStore, IdKind, Payment, StoreFilter,
};

use crate::engine::{ConsistencyEngine, DeleteOutcome, date_string, mirror, to_json};
use crate::error::EngineError;

/// Status applied to every recorded payment.
const APPROVED_STATUS: &str = "approved";

/// Intake form for a new payment. The point-of-sale UI submits the
/// customer and order as embedded JSON strings.
#[derive(Debug, Clone, Default)]
pub struct NewPaymentForm {
    /// JSON object with `firstname`/`lastname`/`phone`/`email`.
    pub customer: String,
    /// JSON array of line items.
    pub order: String,
    pub order_total: String,
    pub payment_method: String,
    /// Ticket ID to link the payment to, or empty.
    pub linked_ticket: String,
}

impl<S: DocumentStore> ConsistencyEngine<S> {
    /// Record a payment, mirroring it under the paying customer and the
    /// linked ticket when those associations exist.
    ///
    /// A walk-in payment may carry no phone at all; a non-empty phone
    /// must be valid AND already registered — payments never synthesize
    /// customers. All copies are written in one atomic update.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed embedded JSON, a bad total, an invalid
    /// or unregistered phone, or a linked ticket that does not exist;
    /// `NotFound` for an unknown store.
    pub async fn create_payment(
        &self,
        storename: &str,
        form: &NewPaymentForm,
    ) -> Result<(PaymentId, Payment), EngineError> {
        let submitted: CustomerSnapshot = serde_json::from_str(&form.customer)
            .map_err(|_| EngineError::field("customerError", "Invalid customer data"))?;
        let order: Value = serde_json::from_str(&form.order)
            .map_err(|_| EngineError::field("orderError", "Invalid order data"))?;
        let order_total = Decimal::from_str(form.order_total.trim())
            .map_err(|_| EngineError::field("orderTotalError", "Invalid order total"))?;
        let linked = LinkedTicket::parse_form(&form.linked_ticket);

        let doc = self.get_store(storename).await?;

        let phone = submitted.phone.trim().to_owned();
        if !phone.is_empty() {
            PhoneNumber::parse(&phone)
                .map_err(|_| EngineError::field("phoneError", "Invalid Phone Number"))?;
            if doc.customer(&phone).is_none() {
                return Err(EngineError::field("phoneError", "Phone number not registered"));
            }
        }

        if let Some(ticket) = linked.get()
            && doc.ticket(ticket).is_none()
        {
            return Err(EngineError::field("linkedTicketError", "Linked ticket not found"));
        }

        let filter = StoreFilter::storename(storename);
        let id = PaymentId::new(self.store().allocate_id(&filter, IdKind::Payment).await?);

        let payment = Payment {
            customer: CustomerSnapshot {
                firstname: submitted.firstname,
                lastname: submitted.lastname,
                phone,
                email: submitted.email,
            },
            order_total,
            order_items: order,
            payment_method: form.payment_method.clone(),
            linked_ticket: linked,
            status: APPROVED_STATUS.to_owned(),
            date: date_string(),
        };

        let record = to_json(&payment)?;
        let writes = mirror::payment_locations(&payment, id)
            .into_iter()
            .map(|path| (path, record.clone()))
            .collect();
        self.store().set_fields(&filter, writes).await?;

        Ok((id, payment))
    }

    /// One canonical payment.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or payment.
    pub async fn get_payment(
        &self,
        storename: &str,
        id: PaymentId,
    ) -> Result<Payment, EngineError> {
        let doc = self.get_store(storename).await?;
        doc.payment(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("payment", id.key()))
    }

    /// All payments with their IDs, sorted by the paying customer's
    /// firstname.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn list_payments(
        &self,
        storename: &str,
    ) -> Result<Vec<(PaymentId, Payment)>, EngineError> {
        let doc = self.get_store(storename).await?;
        let mut payments: Vec<(PaymentId, Payment)> = doc
            .payments
            .into_iter()
            .filter_map(|(key, payment)| key.parse::<PaymentId>().ok().map(|id| (id, payment)))
            .collect();
        payments.sort_by(|a, b| a.1.customer.firstname.cmp(&b.1.customer.firstname));
        Ok(payments)
    }

    /// Remove a payment from every location it is mirrored to.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn delete_payment(
        &self,
        storename: &str,
        id: PaymentId,
    ) -> Result<DeleteOutcome, EngineError> {
        let doc = self.get_store(storename).await?;
        let Some(payment) = doc.payment(id) else {
            return Ok(DeleteOutcome::NotFound);
        };

        self.store()
            .unset_fields(
                &StoreFilter::storename(storename),
                mirror::payment_locations(payment, id),
            )
            .await?;

        Ok(DeleteOutcome::Deleted)
    }
}
