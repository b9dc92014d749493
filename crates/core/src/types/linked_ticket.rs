//! Optional payment-to-ticket association.
//!
//! Payments carry a `linkedTicket` field that is either empty or the ID of
//! the ticket the payment was collected against. Documents encode the
//! absent case as an empty string, so this type serializes to/from that
//! wire form while keeping the association an explicit option in code.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::TicketId;

/// Optional association from a payment to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkedTicket(Option<TicketId>);

impl LinkedTicket {
    /// No linked ticket.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Link to the given ticket.
    #[must_use]
    pub const fn to(id: TicketId) -> Self {
        Self(Some(id))
    }

    /// The linked ticket ID, if any.
    #[must_use]
    pub const fn get(&self) -> Option<TicketId> {
        self.0
    }

    /// Whether a ticket is linked.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.0.is_some()
    }

    /// Parse form input: a decimal ticket ID links, anything else does not.
    ///
    /// Replaces the old "length > 3 looks like a real ID" heuristic with an
    /// actual parse.
    #[must_use]
    pub fn parse_form(input: &str) -> Self {
        Self(input.trim().parse::<TicketId>().ok())
    }
}

impl From<Option<TicketId>> for LinkedTicket {
    fn from(id: Option<TicketId>) -> Self {
        Self(id)
    }
}

impl fmt::Display for LinkedTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => Ok(()),
        }
    }
}

impl Serialize for LinkedTicket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(id) => serializer.serialize_str(&id.key()),
            None => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for LinkedTicket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(Self(None));
        }
        raw.parse::<TicketId>()
            .map(|id| Self(Some(id)))
            .map_err(|_| {
                serde::de::Error::invalid_value(
                    serde::de::Unexpected::Str(&raw),
                    &"a decimal ticket ID or empty string",
                )
            })
    }
}
