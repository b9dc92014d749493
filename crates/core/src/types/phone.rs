//! Phone number type.
//!
//! Customer phone numbers are the sole identity key inside a store
//! document, so the stored form is exactly what keys the `customers` map:
//! the trimmed input. Validation accepts the permissive North-American
//! shapes the service has always taken on intake forms.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not match any accepted phone shape.
    #[error("not a valid phone number")]
    InvalidFormat,
}

/// A customer phone number.
///
/// Accepted shapes (10 significant digits):
///
/// - `5551234567`
/// - `555-123-4567` / `555 123 4567`
/// - `(555) 123-4567`
/// - `+1 555 123 4567` (1-3 digit country code)
/// - any of the above followed by an extension: `ext 12`, `Ext. 12`,
///   `ext: 12`, `x12`
///
/// The stored form is the trimmed input. The map key a customer lives
/// under is exactly this stored form; [`PhoneNumber::digits`] gives the
/// digits-only rendering used when matching loosely-formatted input
/// against an existing key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a `PhoneNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] for blank input and
    /// [`PhoneError::InvalidFormat`] when the input does not match any
    /// accepted shape.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        if is_valid_phone(trimmed) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(PhoneError::InvalidFormat)
        }
    }

    /// Returns the phone number as stored (trimmed input).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns only the digits of the number.
    ///
    /// Used to normalize loosely-formatted input before comparing it to an
    /// existing customer key.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Cursor over the input for the hand-rolled shape check below.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    const fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn eat(&mut self, prefix: char) -> bool {
        if let Some(stripped) = self.rest.strip_prefix(prefix) {
            self.rest = stripped;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, choices: &[char]) -> bool {
        choices.iter().any(|&c| self.eat(c))
    }

    /// Consume between `min` and `max` ASCII digits; returns the count or
    /// `None` when fewer than `min` are present.
    fn eat_digits(&mut self, min: usize, max: usize) -> Option<usize> {
        let count = self
            .rest
            .chars()
            .take(max)
            .take_while(char::is_ascii_digit)
            .count();
        if count < min {
            return None;
        }
        self.rest = self.rest.get(count..).unwrap_or("");
        Some(count)
    }

    fn eat_str_ignore_case(&mut self, word: &str) -> bool {
        let Some(head) = self.rest.get(..word.len()) else {
            return false;
        };
        if head.eq_ignore_ascii_case(word) {
            self.rest = self.rest.get(word.len()..).unwrap_or("");
            true
        } else {
            false
        }
    }

    const fn done(&self) -> bool {
        self.rest.is_empty()
    }
}

/// Shape check for the accepted phone formats.
fn is_valid_phone(input: &str) -> bool {
    let mut s = Scanner::new(input);

    // Optional country code: '+' then 1-3 digits, optional space.
    if s.eat('+') {
        if s.eat_digits(1, 3).is_none() {
            return false;
        }
        s.eat(' ');
    }

    // Area code: "(555)" with optional trailing space, or "555" with an
    // optional space/dash separator.
    if s.eat('(') {
        if s.eat_digits(3, 3).is_none() || !s.eat(')') {
            return false;
        }
        s.eat(' ');
    } else {
        if s.eat_digits(3, 3).is_none() {
            return false;
        }
        s.eat_any(&[' ', '-']);
    }

    // Exchange: three digits, optional separator.
    if s.eat_digits(3, 3).is_none() {
        return false;
    }
    s.eat_any(&[' ', '-']);

    // Subscriber number: four digits.
    if s.eat_digits(4, 4).is_none() {
        return false;
    }

    if s.done() {
        return true;
    }

    // Optional extension: "ext"/"Ext" with optional ':' or '.', or 'x',
    // then optional space and at least one digit.
    s.eat(' ');
    if s.eat_str_ignore_case("ext") {
        s.eat_any(&[':', '.']);
    } else if !s.eat_any(&['x', 'X']) {
        return false;
    }
    s.eat(' ');
    if s.eat_digits(1, usize::MAX).is_none() {
        return false;
    }

    s.done()
}
