//! Shopdesk Core - Shared types library.
//!
//! This crate provides common types used across all Shopdesk components:
//! - `store` - Store document model and persistence abstraction
//! - `engine` - Denormalized document consistency engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no document store access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, phone numbers, emails,
//!   and ticket links

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
