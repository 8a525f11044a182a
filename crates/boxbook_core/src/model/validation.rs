//! Record-level validation errors.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Violation of a single-record invariant.
///
/// Cross-record rules (one owning box per stored book) are not checked here;
/// they belong to the inventory service.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    /// Box name is blank after trim.
    BlankBoxName,
    /// Book title is blank after trim.
    BlankBookTitle,
    /// Price is negative, NaN or infinite.
    InvalidPrice(f64),
    /// Box contents exceed capacity.
    BoxOverCapacity { box_id: Uuid, len: usize },
    /// The same book id appears twice in one box.
    DuplicateBookInBox { box_id: Uuid, book_id: Uuid },
    /// `updated_at` is earlier than `created_at`.
    UpdatedBeforeCreated {
        id: Uuid,
        created_at: i64,
        updated_at: i64,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankBoxName => write!(f, "box name must not be blank"),
            Self::BlankBookTitle => write!(f, "book title must not be blank"),
            Self::InvalidPrice(price) => {
                write!(f, "book price must be a non-negative number, got {price}")
            }
            Self::BoxOverCapacity { box_id, len } => write!(
                f,
                "box {box_id} holds {len} books, capacity is {}",
                super::BOX_CAPACITY
            ),
            Self::DuplicateBookInBox { box_id, book_id } => {
                write!(f, "book {book_id} appears more than once in box {box_id}")
            }
            Self::UpdatedBeforeCreated {
                id,
                created_at,
                updated_at,
            } => write!(
                f,
                "record {id} has updated_at {updated_at} earlier than created_at {created_at}"
            ),
        }
    }
}

impl Error for RecordValidationError {}

pub(crate) fn validate_timestamps(
    id: Uuid,
    created_at: i64,
    updated_at: Option<i64>,
) -> Result<(), RecordValidationError> {
    match updated_at {
        Some(updated_at) if updated_at < created_at => {
            Err(RecordValidationError::UpdatedBeforeCreated {
                id,
                created_at,
                updated_at,
            })
        }
        _ => Ok(()),
    }
}
