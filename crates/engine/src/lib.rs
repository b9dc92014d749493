//! Shopdesk Engine - denormalized document consistency engine.
//!
//! Each store document duplicates ticket and payment records into mirrors
//! embedded under the owning customer (and, for payments, the linked
//! ticket) for fast per-customer reads. This crate owns the creation,
//! mutation, rename, and deletion workflows that keep the canonical
//! records and their mirrors in agreement, without transactions:
//!
//! - every logical mutation's mirror writes are built by one internal
//!   helper and issued as a single atomic document update
//! - record IDs come from the store's atomic per-store allocator
//! - all pre-write validation (phone/email format, identity match,
//!   uniqueness) happens before the first write, so a validation failure
//!   leaves the document untouched
//!
//! # Modules
//!
//! - [`engine`] - The [`ConsistencyEngine`] and its operations
//! - [`validate`] - Field-keyed validation errors and checks
//! - [`gateway`] - SMS and shipment tracking gateway clients
//! - [`config`] - Gateway configuration from environment variables
//! - [`error`] - Unified error type

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod validate;

pub use engine::{ConsistencyEngine, DeleteOutcome};
pub use error::EngineError;
pub use validate::FieldErrors;
