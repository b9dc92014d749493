//! The document store abstraction.
//!
//! One document per store; partial-update primitives address nested map
//! entries through [`DocPath`]. Every call is atomic at document
//! granularity, which is exactly the unit of contention: the consistency
//! engine collapses each logical mutation's mirror writes into a single
//! `set_fields` call so the mirrors cannot tear.

use serde_json::Value;
use thiserror::Error;

use crate::document::StoreDocument;
use crate::path::DocPath;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document matched the filter.
    #[error("no store document matched the filter")]
    NotFound,

    /// A document with this storename already exists.
    #[error("store {0:?} already registered")]
    DuplicateStorename(String),

    /// A path traversal hit a non-object intermediate value.
    #[error("path conflict at {path}")]
    PathConflict {
        /// Dotted rendering of the conflicting path.
        path: String,
    },

    /// Stored data does not round-trip through the typed model.
    #[error("data corruption: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Filter selecting one store document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFilter {
    /// By unique storename (the document key).
    Storename(String),
    /// By the store-issued employee signup code.
    SignupCode(String),
    /// By the store's SMS sub-account identifier (inbound webhooks).
    SmsAccountSid(String),
}

impl StoreFilter {
    /// Convenience constructor for the common by-name case.
    #[must_use]
    pub fn storename(name: &str) -> Self {
        Self::Storename(name.to_owned())
    }
}

/// Which store-scoped ID sequence to allocate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Ticket,
    Payment,
}

impl IdKind {
    /// First ID handed out when the collection is empty.
    #[must_use]
    pub const fn floor(self) -> u32 {
        match self {
            Self::Ticket => 2000,
            Self::Payment => 99,
        }
    }

    /// Document key of the collection this sequence feeds.
    #[must_use]
    pub const fn collection_key(self) -> &'static str {
        match self {
            Self::Ticket => "tickets",
            Self::Payment => "payments",
        }
    }

    /// Document key of the persisted counter.
    #[must_use]
    pub const fn counter_key(self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Payment => "payment",
        }
    }
}

/// How `remove_from_array` matches items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayMatcher {
    /// Remove items equal to the value.
    Equals(Value),
    /// Remove array-shaped items whose first element equals the value
    /// (used for `[name, color]` vocabulary pairs).
    First(Value),
}

impl ArrayMatcher {
    /// Whether `item` matches.
    #[must_use]
    pub fn matches(&self, item: &Value) -> bool {
        match self {
            Self::Equals(value) => item == value,
            Self::First(value) => item
                .as_array()
                .and_then(|a| a.first())
                .is_some_and(|first| first == value),
        }
    }
}

/// Persistence abstraction over per-store documents.
///
/// Implementations must make each method call atomic with respect to the
/// matched document. Nothing here coordinates across calls; multi-call
/// workflows accept the torn-write window and surface late failures as
/// partial-write errors upstream.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Insert a new store document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateStorename`] if the storename is taken.
    async fn insert(&self, doc: StoreDocument) -> Result<(), StoreError>;

    /// Fetch the document matching the filter, deserialized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the stored data does not
    /// round-trip through the typed model.
    async fn find_one(&self, filter: &StoreFilter) -> Result<Option<StoreDocument>, StoreError>;

    /// Fetch the raw document tree matching the filter.
    ///
    /// # Errors
    ///
    /// Implementation-specific storage failures.
    async fn find_raw(&self, filter: &StoreFilter) -> Result<Option<Value>, StoreError>;

    /// Set several paths in one atomic document update. Intermediate
    /// objects are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document matches, or
    /// [`StoreError::PathConflict`] if a path crosses a non-object value.
    async fn set_fields(
        &self,
        filter: &StoreFilter,
        writes: Vec<(DocPath, Value)>,
    ) -> Result<(), StoreError>;

    /// Remove several paths in one atomic document update. Missing paths
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document matches.
    async fn unset_fields(&self, filter: &StoreFilter, paths: Vec<DocPath>)
    -> Result<(), StoreError>;

    /// Atomically move the sub-document at `from` to `to`. A missing
    /// source is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document matches.
    async fn rename_field(
        &self,
        filter: &StoreFilter,
        from: &DocPath,
        to: &DocPath,
    ) -> Result<(), StoreError>;

    /// Append an item to the array at `path`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathConflict`] if the path holds a non-array.
    async fn append_to_array(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        item: Value,
    ) -> Result<(), StoreError>;

    /// Remove all matching items from the array at `path`. A missing
    /// array is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document matches.
    async fn remove_from_array(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        matcher: &ArrayMatcher,
    ) -> Result<(), StoreError>;

    /// Append an item to the array at `path` unless an equal item is
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathConflict`] if the path holds a non-array.
    async fn add_unique(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        item: Value,
    ) -> Result<(), StoreError>;

    /// Atomically allocate the next ID in a store-scoped sequence.
    ///
    /// The persisted counter is seeded from the existing collection keys
    /// (or the sequence floor) and never moves backwards, so an ID is
    /// never reused even after the highest record is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document matches.
    async fn allocate_id(&self, filter: &StoreFilter, kind: IdKind) -> Result<u32, StoreError>;
}
