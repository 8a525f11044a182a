//! Inventory domain model.
//!
//! # Responsibility
//! - Define the canonical box and book records used by core business logic.
//! - Provide record-local validation shared by every storage adapter.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - A box holds at most [`BOX_CAPACITY`] distinct book ids.
//! - Book status is a closed two-valued enum, never free-form text.

pub mod book;
pub mod box_record;
pub mod validation;

pub use box_record::BOX_CAPACITY;
