//! Typed partial-update paths.
//!
//! Every addressable location inside a store document gets a constructor
//! here instead of callers assembling dotted strings. User-controlled
//! values (phone numbers, record IDs) become single opaque segments, so a
//! phone number containing a dot can never address a different location.

use core::fmt;

use shopdesk_core::{PaymentId, TicketId};

/// Mutable scalar fields of a ticket (canonical or embedded copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    Subject,
    Issue,
    Description,
    Status,
    LastUpdated,
    ShippingTracking,
    ShippingCarrier,
}

impl TicketField {
    const fn segments(self) -> &'static [&'static str] {
        match self {
            Self::Subject => &["subject"],
            Self::Issue => &["issue"],
            Self::Description => &["description"],
            Self::Status => &["status"],
            Self::LastUpdated => &["lastUpdated"],
            Self::ShippingTracking => &["shipping", "tracking"],
            Self::ShippingCarrier => &["shipping", "carrier"],
        }
    }
}

/// Identity fields of a customer record or embedded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerField {
    Firstname,
    Lastname,
    Phone,
    Email,
}

impl CustomerField {
    const fn segment(self) -> &'static str {
        match self {
            Self::Firstname => "firstname",
            Self::Lastname => "lastname",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }

    /// All identity fields, in snapshot-rewrite order.
    pub const ALL: [Self; 4] = [Self::Firstname, Self::Lastname, Self::Phone, Self::Email];
}

/// Mutable scalar fields of a payment (canonical or mirror copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentField {
    LinkedTicket,
    Status,
}

impl PaymentField {
    const fn segment(self) -> &'static str {
        match self {
            Self::LinkedTicket => "linkedTicket",
            Self::Status => "status",
        }
    }
}

/// Fields of the store address setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Primary,
    City,
    Province,
    Postal,
}

impl AddressField {
    const fn segment(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::City => "city",
            Self::Province => "province",
            Self::Postal => "postal",
        }
    }
}

/// A path addressing one location inside a store document.
///
/// Construct only through the typed constructors; the segment list is not
/// otherwise extensible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    fn from_parts(parts: Vec<String>) -> Self {
        Self { segments: parts }
    }

    /// The whole customer record at `customers.<phone>`.
    #[must_use]
    pub fn customer(phone: &str) -> Self {
        Self::from_parts(vec!["customers".into(), phone.into()])
    }

    /// One identity field of a customer record.
    #[must_use]
    pub fn customer_field(phone: &str, field: CustomerField) -> Self {
        let mut p = Self::customer(phone);
        p.segments.push(field.segment().into());
        p
    }

    /// The embedded ticket copy at `customers.<phone>.tickets.<id>`.
    #[must_use]
    pub fn customer_ticket(phone: &str, id: TicketId) -> Self {
        let mut p = Self::customer(phone);
        p.segments.push("tickets".into());
        p.segments.push(id.key());
        p
    }

    /// One field of the embedded ticket copy.
    #[must_use]
    pub fn customer_ticket_field(phone: &str, id: TicketId, field: TicketField) -> Self {
        let mut p = Self::customer_ticket(phone, id);
        p.segments
            .extend(field.segments().iter().map(|s| (*s).to_owned()));
        p
    }

    /// The payment mirror at `customers.<phone>.payments.<id>`.
    #[must_use]
    pub fn customer_payment(phone: &str, id: PaymentId) -> Self {
        let mut p = Self::customer(phone);
        p.segments.push("payments".into());
        p.segments.push(id.key());
        p
    }

    /// One field of the customer-embedded payment mirror.
    #[must_use]
    pub fn customer_payment_field(phone: &str, id: PaymentId, field: PaymentField) -> Self {
        let mut p = Self::customer_payment(phone, id);
        p.segments.push(field.segment().into());
        p
    }

    /// One identity field of the snapshot inside a customer-embedded
    /// payment mirror.
    #[must_use]
    pub fn customer_payment_snapshot_field(
        phone: &str,
        id: PaymentId,
        field: CustomerField,
    ) -> Self {
        let mut p = Self::customer_payment(phone, id);
        p.segments.push("customer".into());
        p.segments.push(field.segment().into());
        p
    }

    /// The canonical ticket at `tickets.<id>`.
    #[must_use]
    pub fn ticket(id: TicketId) -> Self {
        Self::from_parts(vec!["tickets".into(), id.key()])
    }

    /// One field of the canonical ticket.
    #[must_use]
    pub fn ticket_field(id: TicketId, field: TicketField) -> Self {
        let mut p = Self::ticket(id);
        p.segments
            .extend(field.segments().iter().map(|s| (*s).to_owned()));
        p
    }

    /// One identity field of the customer snapshot on a canonical ticket.
    #[must_use]
    pub fn ticket_snapshot_field(id: TicketId, field: CustomerField) -> Self {
        let mut p = Self::ticket(id);
        p.segments.push("customer".into());
        p.segments.push(field.segment().into());
        p
    }

    /// The payment mirror at `tickets.<ticket>.payments.<payment>`.
    #[must_use]
    pub fn ticket_payment(ticket: TicketId, payment: PaymentId) -> Self {
        let mut p = Self::ticket(ticket);
        p.segments.push("payments".into());
        p.segments.push(payment.key());
        p
    }

    /// One field of the ticket-embedded payment mirror.
    #[must_use]
    pub fn ticket_payment_field(ticket: TicketId, payment: PaymentId, field: PaymentField) -> Self {
        let mut p = Self::ticket_payment(ticket, payment);
        p.segments.push(field.segment().into());
        p
    }

    /// One identity field of the snapshot inside a ticket-embedded
    /// payment mirror.
    #[must_use]
    pub fn ticket_payment_snapshot_field(
        ticket: TicketId,
        payment: PaymentId,
        field: CustomerField,
    ) -> Self {
        let mut p = Self::ticket_payment(ticket, payment);
        p.segments.push("customer".into());
        p.segments.push(field.segment().into());
        p
    }

    /// The SMS transcript array on a canonical ticket.
    #[must_use]
    pub fn ticket_sms_log(id: TicketId) -> Self {
        let mut p = Self::ticket(id);
        p.segments.push("smsData".into());
        p
    }

    /// The canonical payment at `payments.<id>`.
    #[must_use]
    pub fn payment(id: PaymentId) -> Self {
        Self::from_parts(vec!["payments".into(), id.key()])
    }

    /// One field of the canonical payment.
    #[must_use]
    pub fn payment_field(id: PaymentId, field: PaymentField) -> Self {
        let mut p = Self::payment(id);
        p.segments.push(field.segment().into());
        p
    }

    /// One identity field of the snapshot on a canonical payment.
    #[must_use]
    pub fn payment_snapshot_field(id: PaymentId, field: CustomerField) -> Self {
        let mut p = Self::payment(id);
        p.segments.push("customer".into());
        p.segments.push(field.segment().into());
        p
    }

    /// The store's SMS sub-account credentials.
    #[must_use]
    pub fn sms_account() -> Self {
        Self::from_parts(vec!["smsAccount".into()])
    }

    /// The configured ticket status vocabulary (`[name, color]` pairs).
    #[must_use]
    pub fn ticket_status_settings() -> Self {
        Self::from_parts(vec!["settings".into(), "tickets".into(), "status".into()])
    }

    /// The configured issue vocabulary.
    #[must_use]
    pub fn issue_settings() -> Self {
        Self::from_parts(vec!["settings".into(), "tickets".into(), "issue".into()])
    }

    /// The configured payment categories.
    #[must_use]
    pub fn payment_categories() -> Self {
        Self::from_parts(vec![
            "settings".into(),
            "payments".into(),
            "categories".into(),
        ])
    }

    /// The store tax rate setting.
    #[must_use]
    pub fn tax_rate() -> Self {
        Self::from_parts(vec![
            "settings".into(),
            "payments".into(),
            "taxRate".into(),
        ])
    }

    /// One field of the store address setting.
    #[must_use]
    pub fn address_field(field: AddressField) -> Self {
        Self::from_parts(vec![
            "settings".into(),
            "payments".into(),
            "address".into(),
            field.segment().into(),
        ])
    }

    /// Path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocPath {
    /// Dotted rendering for logs and error context only; never fed back
    /// into document traversal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
