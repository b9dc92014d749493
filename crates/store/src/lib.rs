//! Shopdesk Store - document model and persistence abstraction.
//!
//! Each tenant ("store") owns one document aggregating its customers,
//! tickets, payments, and settings. Tickets and payments each have one
//! canonical representation plus zero to two synchronized mirrors embedded
//! under the owning customer or linked ticket; the consistency engine in
//! `shopdesk-engine` is responsible for keeping those in agreement.
//!
//! # Modules
//!
//! - [`document`] - Typed document model (`StoreDocument` and friends)
//! - [`path`] - Typed partial-update path builder (`DocPath`)
//! - [`store`] - The `DocumentStore` trait and its error/filter types
//! - [`memory`] - In-memory reference implementation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod document;
pub mod memory;
pub mod path;
pub mod store;

pub use document::{
    Customer, CustomerSnapshot, IdCounters, Payment, PaymentSettings, Shipping, SmsAccount,
    SmsDirection, SmsEntry, StoreAddress, StoreDocument, StoreSettings, Ticket, TicketSettings,
    TicketSummary,
};
pub use memory::MemoryStore;
pub use path::{AddressField, CustomerField, DocPath, PaymentField, TicketField};
pub use store::{ArrayMatcher, DocumentStore, IdKind, StoreError, StoreFilter};
