//! Storage adapter contracts and implementations.
//!
//! # Responsibility
//! - Define the narrow get/put/delete/list boundary the inventory service uses.
//! - Provide a SQLite ledger adapter and a process-local memory adapter.
//!
//! # Invariants
//! - Write paths call `validate()` on records before persisting them.
//! - Adapters know nothing about box/book cross-record rules.
//! - `atomically` either applies every write made by its closure or none.

pub mod inventory_repo;
pub mod memory_repo;
pub mod sqlite_repo;

use crate::model::book::BookRecord;
use crate::model::box_record::BoxRecord;

/// Orders boxes by `created_at ASC, id ASC`.
pub(crate) fn sort_boxes(boxes: &mut [BoxRecord]) {
    boxes.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
}

/// Orders books by `created_at ASC, id ASC`.
pub(crate) fn sort_books(books: &mut [BookRecord]) {
    books.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
}
