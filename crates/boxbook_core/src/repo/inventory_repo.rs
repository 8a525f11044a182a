//! Inventory storage contracts.
//!
//! # Responsibility
//! - Declare typed get/put/delete/list operations over the box and book
//!   collections.
//! - Declare the atomic unit used by every mutating inventory operation.
//!
//! # Invariants
//! - `put_*` is an upsert keyed by record id; `created_at` of an existing
//!   record is never overwritten.
//! - `delete_*` reports whether a record was removed.

use crate::db::DbError;
use crate::model::book::{BookId, BookRecord};
use crate::model::box_record::{BoxId, BoxRecord};
use crate::model::validation::RecordValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage adapter failure.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed validation before write or after read.
    Validation(RecordValidationError),
    /// SQLite transport or bootstrap error.
    Db(DbError),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// A writer panicked while holding the in-memory store lock.
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted inventory data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "inventory repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "inventory repository requires table `{table}`")
            }
            Self::LockPoisoned => write!(f, "in-memory inventory store lock is poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::LockPoisoned => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Typed key-value access to the box and book collections.
pub trait InventoryStore {
    fn get_box(&self, id: BoxId) -> RepoResult<Option<BoxRecord>>;
    fn put_box(&self, record: &BoxRecord) -> RepoResult<()>;
    fn delete_box(&self, id: BoxId) -> RepoResult<bool>;
    /// Lists every box ordered by `created_at ASC, id ASC`.
    fn list_boxes(&self) -> RepoResult<Vec<BoxRecord>>;

    fn get_book(&self, id: BookId) -> RepoResult<Option<BookRecord>>;
    fn put_book(&self, record: &BookRecord) -> RepoResult<()>;
    fn delete_book(&self, id: BookId) -> RepoResult<bool>;
    /// Lists every book ordered by `created_at ASC, id ASC`.
    fn list_books(&self) -> RepoResult<Vec<BookRecord>>;
}

/// Storage adapter with an atomic unit of work.
pub trait InventoryRepository: InventoryStore {
    /// Runs `f` so that no other unit observes or mutates the store between
    /// its reads and writes.
    ///
    /// # Contract
    /// - `Ok` commits every write made through the provided store.
    /// - `Err` discards every write made through the provided store.
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn InventoryStore) -> Result<T, E>,
        E: From<RepoError>;
}
