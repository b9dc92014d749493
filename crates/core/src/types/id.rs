//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_record_id!` macro to create type-safe ID wrappers that
//! prevent accidentally mixing ticket and payment identifiers. Store
//! documents key their maps by the decimal string form of these IDs, so
//! every ID type round-trips through `Display`/`FromStr`.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe record ID wrapper.
///
/// Creates a newtype wrapper around `u32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_u32()`, `key()`
/// - `From<u32>` and `Into<u32>` implementations
/// - `FromStr` parsing from a document map key
///
/// # Example
///
/// ```rust
/// # use shopdesk_core::define_record_id;
/// define_record_id!(TicketId);
/// define_record_id!(PaymentId);
///
/// let ticket_id = TicketId::new(2000);
/// assert_eq!(ticket_id.key(), "2000");
///
/// // These are different types, so this won't compile:
/// // let _: TicketId = PaymentId::new(99);
/// ```
#[macro_export]
macro_rules! define_record_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a new ID from a u32 value.
            #[must_use]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Get the underlying u32 value.
            #[must_use]
            pub const fn as_u32(&self) -> u32 {
                self.0
            }

            /// Render the decimal string used as a document map key.
            #[must_use]
            pub fn key(&self) -> String {
                self.0.to_string()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<u32>().map(Self)
            }
        }
    };
}

// Define standard entity IDs
define_record_id!(TicketId);
define_record_id!(PaymentId);

/// Compute the next record ID for a store-scoped collection.
///
/// Returns `floor` when the collection is empty, otherwise one past the
/// largest allocated ID. Tolerates non-contiguous IDs (gaps left by
/// deletions). Tickets use floor `2000`, payments use floor `99`.
#[must_use]
pub fn next_id(ids: impl IntoIterator<Item = u32>, floor: u32) -> u32 {
    ids.into_iter().max().map_or(floor, |max| max + 1)
}

/// Parse document map keys back into typed record IDs.
///
/// Document maps use decimal string keys; keys that are not valid IDs are
/// skipped, so a corrupted document surfaces as missing entries rather
/// than a panic.
#[must_use]
pub fn parse_id_keys<'a, T>(keys: impl IntoIterator<Item = &'a String>) -> Vec<T>
where
    T: std::str::FromStr,
{
    keys.into_iter()
        .filter_map(|k| k.parse::<T>().ok())
        .collect()
}
