//! Book domain model.
//!
//! # Responsibility
//! - Define the item record and its storage status.
//! - Define create/patch request shapes that cannot touch `status`.
//!
//! # Invariants
//! - `id` is stable and never reused for another book.
//! - `status == Stored` iff exactly one box lists this book in `contents`.
//! - `price` is finite and non-negative.

use super::validation::{validate_timestamps, RecordValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a book.
pub type BookId = Uuid;

/// Whether a book is currently linked to a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// Linked to exactly one box.
    Stored,
    /// Not linked to any box.
    Unstored,
}

/// Canonical book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub description: String,
    pub author: String,
    pub price: f64,
    /// Mutated only by `InventoryService` link/unlink paths.
    pub status: BookStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last mutation.
    pub updated_at: Option<i64>,
}

/// Input for creating a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub author: String,
    pub price: f64,
}

/// Partial update for a book's descriptive fields.
///
/// `None` keeps the current value. Status is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl BookRecord {
    /// Creates an unstored book with a generated stable ID.
    pub fn new(input: NewBook, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            author: input.author,
            price: input.price,
            status: BookStatus::Unstored,
            created_at,
            updated_at: None,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.status == BookStatus::Stored
    }

    /// Checks single-record invariants.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecordValidationError::BlankBookTitle);
        }
        validate_price(self.price)?;
        validate_timestamps(self.id, self.created_at, self.updated_at)
    }
}

impl BookPatch {
    /// Replaces the fields present in this patch.
    pub fn apply_to(&self, book: &mut BookRecord) {
        if let Some(title) = &self.title {
            book.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            book.description = description.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(price) = self.price {
            book.price = price;
        }
    }
}

pub(crate) fn validate_price(price: f64) -> Result<(), RecordValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(RecordValidationError::InvalidPrice(price));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{BookPatch, BookRecord, BookStatus, NewBook};
    use crate::model::validation::RecordValidationError;

    fn sample() -> NewBook {
        NewBook {
            title: "Dune".to_string(),
            description: "Desert planet".to_string(),
            author: "Frank Herbert".to_string(),
            price: 9.99,
        }
    }

    #[test]
    fn new_book_starts_unstored() {
        let book = BookRecord::new(sample(), 5);
        assert_eq!(book.status, BookStatus::Unstored);
        assert!(!book.is_stored());
        book.validate().expect("sample book should be valid");
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_prices() {
        let mut book = BookRecord::new(sample(), 5);
        book.price = -0.01;
        assert!(matches!(
            book.validate(),
            Err(RecordValidationError::InvalidPrice(_))
        ));
        book.price = f64::NAN;
        assert!(matches!(
            book.validate(),
            Err(RecordValidationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn patch_replaces_only_present_fields() {
        let mut book = BookRecord::new(sample(), 5);
        let patch = BookPatch {
            price: Some(12.5),
            author: Some("F. Herbert".to_string()),
            ..BookPatch::default()
        };
        patch.apply_to(&mut book);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "F. Herbert");
        assert_eq!(book.price, 12.5);
        assert_eq!(book.status, BookStatus::Unstored);
    }

    #[test]
    fn status_serializes_as_lowercase() {
        let json = serde_json::to_string(&BookStatus::Stored).expect("serialize status");
        assert_eq!(json, "\"stored\"");
        let parsed: BookStatus = serde_json::from_str("\"unstored\"").expect("parse status");
        assert_eq!(parsed, BookStatus::Unstored);
    }

    #[test]
    fn patch_rejects_status_field() {
        let err = serde_json::from_str::<BookPatch>(r#"{"status":"stored"}"#);
        assert!(err.is_err());
    }
}
