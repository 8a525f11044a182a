//! Box domain model.
//!
//! # Responsibility
//! - Define the container record that holds book references.
//! - Provide membership helpers used by the inventory service.
//!
//! # Invariants
//! - `id` is stable and never reused for another box.
//! - `contents` keeps insertion order, has no duplicates and never exceeds
//!   [`BOX_CAPACITY`] entries.
//! - `contents` is only changed through `InventoryService` link/unlink paths.

use super::book::BookId;
use super::validation::{validate_timestamps, RecordValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable identifier for a box.
pub type BoxId = Uuid;

/// Maximum number of books a single box can hold.
pub const BOX_CAPACITY: usize = 5;

/// Canonical box record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxRecord {
    pub id: BoxId,
    /// User-facing label. Trimmed, never blank.
    pub name: String,
    /// Ids of stored books in link order.
    pub contents: Vec<BookId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last mutation, `None` until first change.
    pub updated_at: Option<i64>,
}

impl BoxRecord {
    /// Creates an empty box with a generated stable ID.
    pub fn new(name: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            contents: Vec::new(),
            created_at,
            updated_at: None,
        }
    }

    /// Returns whether `book_id` is linked to this box.
    pub fn contains(&self, book_id: BookId) -> bool {
        self.contents.contains(&book_id)
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Returns whether no further book can be linked.
    pub fn is_full(&self) -> bool {
        self.contents.len() >= BOX_CAPACITY
    }

    /// Checks single-record invariants.
    ///
    /// # Errors
    /// - Blank name.
    /// - More than [`BOX_CAPACITY`] entries or duplicate entries.
    /// - `updated_at` earlier than `created_at`.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecordValidationError::BlankBoxName);
        }

        if self.contents.len() > BOX_CAPACITY {
            return Err(RecordValidationError::BoxOverCapacity {
                box_id: self.id,
                len: self.contents.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.contents.len());
        for book_id in &self.contents {
            if !seen.insert(*book_id) {
                return Err(RecordValidationError::DuplicateBookInBox {
                    box_id: self.id,
                    book_id: *book_id,
                });
            }
        }

        validate_timestamps(self.id, self.created_at, self.updated_at)
    }
}
