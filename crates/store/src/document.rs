//! Typed store document model.
//!
//! Field names mirror the persisted document shape (camelCase keys, record
//! maps keyed by decimal ID strings, customers keyed by trimmed phone
//! number). The canonical ticket carries the customer snapshot and SMS
//! transcript; the copy embedded under the owning customer is a
//! [`TicketSummary`] without either. Payment mirrors are full copies.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopdesk_core::{LinkedTicket, PaymentId, TicketId};

/// Snapshot of customer identity taken when a ticket or payment is
/// created. NOT a live reference; contact-info updates rewrite these
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CustomerSnapshot {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: String,
}

/// Shipping sub-record on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Shipping {
    pub tracking: String,
    pub carrier: String,
}

/// Direction of an SMS transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsDirection {
    Outbound,
    Inbound,
}

/// One entry in a ticket's append-only SMS transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsEntry {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub direction: SmsDirection,
    pub message: String,
}

/// Canonical ticket record, keyed under `tickets.<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub customer: CustomerSnapshot,
    pub subject: String,
    pub issue: String,
    pub description: String,
    pub status: String,
    pub shipping: Shipping,
    /// Mirrors of payments linked to this ticket, keyed by payment ID.
    #[serde(default)]
    pub payments: BTreeMap<String, Payment>,
    /// Epoch milliseconds of the last mutation.
    pub last_updated: i64,
    pub date_created: String,
    /// Append-only SMS transcript.
    #[serde(rename = "smsData", default)]
    pub sms_log: Vec<SmsEntry>,
}

impl Ticket {
    /// The customer-embedded copy of this ticket: identical mutable fields,
    /// no snapshot or SMS transcript.
    #[must_use]
    pub fn summary(&self) -> TicketSummary {
        TicketSummary {
            subject: self.subject.clone(),
            issue: self.issue.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            shipping: self.shipping.clone(),
            last_updated: self.last_updated,
            date_created: self.date_created.clone(),
        }
    }
}

/// Ticket copy embedded under `customers.<phone>.tickets.<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub subject: String,
    pub issue: String,
    pub description: String,
    pub status: String,
    pub shipping: Shipping,
    pub last_updated: i64,
    pub date_created: String,
}

/// Payment record. The same shape is written at `payments.<id>` and at
/// its customer/ticket mirror locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub customer: CustomerSnapshot,
    pub order_total: Decimal,
    pub order_items: Value,
    pub payment_method: String,
    pub linked_ticket: LinkedTicket,
    pub status: String,
    pub date: String,
}

/// Customer record, keyed under `customers.<phone>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub tickets: BTreeMap<String, TicketSummary>,
    #[serde(default)]
    pub payments: BTreeMap<String, Payment>,
    pub date_joined: String,
}

impl Customer {
    /// Snapshot of this customer's current identity fields.
    #[must_use]
    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
        }
    }
}

/// Ticket-related store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TicketSettings {
    /// Configured statuses as `[name, color]` pairs.
    #[serde(default)]
    pub status: Vec<(String, String)>,
    /// Issue category vocabulary.
    #[serde(default)]
    pub issue: Vec<String>,
}

/// Store mailing address used on payment receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreAddress {
    pub primary: String,
    pub city: String,
    pub province: String,
    pub postal: String,
}

/// Payment-related store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tax_rate: String,
    #[serde(default)]
    pub address: StoreAddress,
}

/// Per-store configuration. Simple data; vocabulary mutations never
/// retroactively edit tickets already using a removed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[serde(default)]
    pub tickets: TicketSettings,
    #[serde(default)]
    pub payments: PaymentSettings,
    #[serde(default)]
    pub pay_period: String,
}

/// SMS sub-account credentials for this store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SmsAccount {
    pub sid: String,
    pub auth_token: String,
}

/// Persisted allocator state. Counters hold the last allocated ID and
/// never move backwards, so IDs are not reused even after deleting the
/// highest record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IdCounters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<u32>,
}

/// Root aggregate: one document per tenant, keyed by unique `storename`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    pub storename: String,
    /// Store-issued token allowing employee registrations to join.
    #[serde(default)]
    pub signup_code: String,
    /// Customers keyed by trimmed phone number.
    #[serde(default)]
    pub customers: BTreeMap<String, Customer>,
    /// Tickets keyed by decimal ID string, starting at 2000.
    #[serde(default)]
    pub tickets: BTreeMap<String, Ticket>,
    /// Payments keyed by decimal ID string, starting at 99.
    #[serde(default)]
    pub payments: BTreeMap<String, Payment>,
    #[serde(default)]
    pub counters: IdCounters,
    #[serde(default)]
    pub settings: StoreSettings,
    #[serde(default)]
    pub sms_account: SmsAccount,
}

impl StoreDocument {
    /// A fresh store with empty collections and the given settings.
    #[must_use]
    pub fn new(storename: String, signup_code: String, settings: StoreSettings) -> Self {
        Self {
            storename,
            signup_code,
            customers: BTreeMap::new(),
            tickets: BTreeMap::new(),
            payments: BTreeMap::new(),
            counters: IdCounters::default(),
            settings,
            sms_account: SmsAccount::default(),
        }
    }

    /// Look up a customer by phone key.
    #[must_use]
    pub fn customer(&self, phone: &str) -> Option<&Customer> {
        self.customers.get(phone)
    }

    /// Look up a canonical ticket.
    #[must_use]
    pub fn ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.get(&id.key())
    }

    /// Look up a canonical payment.
    #[must_use]
    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.get(&id.key())
    }
}
