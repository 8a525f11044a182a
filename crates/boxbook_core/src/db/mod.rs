//! SQLite ledger for boxes, books and box membership.
//!
//! # Responsibility
//! - Hand out connections whose schema holds `boxes`, `books` and the
//!   `box_contents` membership table.
//! - Refuse ledgers written by a newer binary.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; `0` means an empty file.
//! - `box_contents` has `UNIQUE(book_uuid)` and `position` in `0..5`, so a
//!   book sits in at most one box slot even if a writer bypasses the service.
//! - Deleting a box cascades to its `box_contents` rows; books are never
//!   removed by a box delete.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Ledger open or migration failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer BoxBook build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "inventory ledger schema v{db_version} requires a newer build (this build supports up to v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
