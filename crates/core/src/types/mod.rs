//! Core types for Shopdesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod linked_ticket;
pub mod phone;

pub use email::{Email, EmailError};
pub use id::*;
pub use linked_ticket::LinkedTicket;
pub use phone::{PhoneError, PhoneNumber};
