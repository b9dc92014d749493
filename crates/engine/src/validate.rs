//! Field-keyed validation results and pre-write checks.
//!
//! Every validator reports through a [`FieldErrors`] mapping from form
//! field name to human-readable message; an operation proceeds only when
//! the mapping is empty. The messages are the ones the intake forms have
//! always shown, so callers can redisplay them as-is.

use std::collections::BTreeMap;

use core::fmt;

use serde::Serialize;

use shopdesk_store::Customer;

/// Ordered mapping from field name to validation message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// An empty mapping (no errors).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping with a single entry.
    #[must_use]
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Record a message for a field, replacing any earlier one.
    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_owned(), message.to_owned());
    }

    /// Whether validation passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message recorded for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate entries in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Normalize a personal name the way the document stores them.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Identity match against the customer on file for a phone number.
///
/// A registered phone is an identity anchor: an incoming submission must
/// carry the same firstname/lastname (case/whitespace-insensitively) as
/// the record on file, otherwise the write halts with a field-specific
/// error and no partial state is created.
#[must_use]
pub fn check_identity(on_file: &Customer, firstname: &str, lastname: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if normalize_name(firstname) != on_file.firstname {
        errors.insert("firstnameError", "Firstname doesnt match account on file");
    } else if normalize_name(lastname) != on_file.lastname {
        errors.insert("lastnameError", "Lastname doesnt match account on file");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    fn customer() -> Customer {
        Customer {
            firstname: "jane".into(),
            lastname: "doe".into(),
            phone: "5551234567".into(),
            email: "jane@example.com".into(),
            tickets: BTreeMap::new(),
            payments: BTreeMap::new(),
            date_joined: "Mon Nov 13 2023".into(),
        }
    }

    #[test]
    fn test_identity_match_is_case_and_whitespace_insensitive() {
        let errors = check_identity(&customer(), "  JANE ", "Doe");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_identity_mismatch_reports_firstname_first() {
        let errors = check_identity(&customer(), "john", "smith");
        assert_eq!(
            errors.get("firstnameError"),
            Some("Firstname doesnt match account on file")
        );
        // Firstname mismatch short-circuits the lastname check.
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_identity_mismatch_lastname() {
        let errors = check_identity(&customer(), "jane", "smith");
        assert_eq!(
            errors.get("lastnameError"),
            Some("Lastname doesnt match account on file")
        );
    }

    #[test]
    fn test_field_errors_serialize_as_plain_map() {
        let errors = FieldErrors::single("phoneError", "Invalid phone number");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"phoneError": "Invalid phone number"})
        );
    }
}
