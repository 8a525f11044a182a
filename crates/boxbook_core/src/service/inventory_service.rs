//! Inventory use-case service.
//!
//! # Responsibility
//! - Enforce box/book referential integrity above the storage adapter.
//! - Provide create, link, unlink, update, delete, list and locate APIs.
//!
//! # Invariants
//! - A book is `Stored` iff exactly one box lists it in `contents`.
//! - A box never lists more than `BOX_CAPACITY` books.
//! - `contents` and `status` change only through link/unlink paths here.
//! - Every mutating API runs as one `InventoryRepository::atomically` unit.

use crate::clock::{Clock, SystemClock};
use crate::model::book::{BookId, BookPatch, BookRecord, BookStatus, NewBook};
use crate::model::box_record::{BoxId, BoxRecord};
use crate::model::validation::RecordValidationError;
use crate::repo::inventory_repo::{InventoryRepository, InventoryStore, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Failure category used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced identifier is unresolvable.
    NotFound,
    /// Book exists but is not linked to any box.
    NotStored,
    /// The requested mutation would break a box/book invariant.
    ConflictOfState,
    /// Box is already at capacity.
    CapacityExceeded,
    /// Caller supplied an invalid field value.
    InvalidInput,
    /// Storage failure or corrupted state.
    InfrastructureFailure,
}

/// Errors from inventory operations.
#[derive(Debug)]
pub enum InventoryError {
    BoxNotFound(BoxId),
    BookNotFound(BookId),
    /// Book is already listed in this box.
    AlreadyLinked { box_id: BoxId, book_id: BookId },
    /// Book is stored in this or another box.
    BookAlreadyStored(BookId),
    /// Book is not listed in this box.
    NotLinked { box_id: BoxId, book_id: BookId },
    /// Box still lists books.
    BoxNotEmpty(BoxId),
    /// Book must be removed from its box first.
    BookStillStored(BookId),
    /// Book is not linked to any box.
    NotStored(BookId),
    BoxFull(BoxId),
    InvalidInput(RecordValidationError),
    /// Stored data contradicts a cross-record invariant.
    InconsistentState(String),
    /// Storage adapter failure.
    Repo(RepoError),
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BoxNotFound(_) | Self::BookNotFound(_) => ErrorKind::NotFound,
            Self::NotStored(_) => ErrorKind::NotStored,
            Self::AlreadyLinked { .. }
            | Self::BookAlreadyStored(_)
            | Self::NotLinked { .. }
            | Self::BoxNotEmpty(_)
            | Self::BookStillStored(_) => ErrorKind::ConflictOfState,
            Self::BoxFull(_) => ErrorKind::CapacityExceeded,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InconsistentState(_) | Self::Repo(_) => ErrorKind::InfrastructureFailure,
        }
    }

    /// Stable machine-readable code for logs and response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BoxNotFound(_) => "box_not_found",
            Self::BookNotFound(_) => "book_not_found",
            Self::AlreadyLinked { .. } => "already_linked",
            Self::BookAlreadyStored(_) => "book_already_stored",
            Self::NotLinked { .. } => "not_linked",
            Self::BoxNotEmpty(_) => "box_not_empty",
            Self::BookStillStored(_) => "book_still_stored",
            Self::NotStored(_) => "not_stored",
            Self::BoxFull(_) => "box_full",
            Self::InvalidInput(_) => "invalid_input",
            Self::InconsistentState(_) => "inconsistent_state",
            Self::Repo(_) => "storage_failure",
        }
    }
}

impl Display for InventoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoxNotFound(id) => write!(f, "box not found: {id}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::AlreadyLinked { box_id, book_id } => {
                write!(f, "book {book_id} is already stored in box {box_id}")
            }
            Self::BookAlreadyStored(id) => {
                write!(f, "book {id} is already stored in this or another box")
            }
            Self::NotLinked { box_id, book_id } => {
                write!(f, "book {book_id} is not stored in box {box_id}")
            }
            Self::BoxNotEmpty(id) => write!(f, "box {id} must be emptied before deletion"),
            Self::BookStillStored(id) => {
                write!(f, "book {id} must be removed from its box before deletion")
            }
            Self::NotStored(id) => write!(f, "book {id} is not stored in any box"),
            Self::BoxFull(id) => write!(f, "box {id} is full"),
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent inventory state: {details}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InventoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for InventoryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Inventory service facade over a storage adapter.
///
/// The service takes ownership of its repository, so callers holding a
/// service cannot reach `contents` or `status` through any other path.
pub struct InventoryService<R: InventoryRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: InventoryRepository> InventoryService<R> {
    /// Creates a service stamping records with wall-clock time.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: InventoryRepository, C: Clock> InventoryService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates an empty box.
    ///
    /// # Errors
    /// - [`InventoryError::InvalidInput`] when `name` is blank.
    pub fn create_box(&self, name: impl Into<String>) -> InventoryResult<BoxRecord> {
        let name: String = name.into();
        let record = BoxRecord::new(name.trim(), self.clock.now_ms());
        record.validate().map_err(InventoryError::InvalidInput)?;

        let result = self.repo.atomically(|store| -> InventoryResult<BoxRecord> {
            store.put_box(&record)?;
            Ok(record)
        });
        log_outcome("box_create", result, String::new)
    }

    /// Renames a box.
    pub fn update_box(&self, box_id: BoxId, name: impl Into<String>) -> InventoryResult<BoxRecord> {
        let name: String = name.into();
        let name = name.trim().to_string();
        let result = self.repo.atomically(|store| -> InventoryResult<BoxRecord> {
            let mut record = require_box(store, box_id)?;
            record.name = name;
            record.updated_at = Some(self.touch(record.created_at));
            record.validate().map_err(InventoryError::InvalidInput)?;
            store.put_box(&record)?;
            Ok(record)
        });
        log_outcome("box_update", result, || format!("box_id={box_id}"))
    }

    /// Deletes an empty box.
    ///
    /// # Errors
    /// - [`InventoryError::BoxNotFound`]
    /// - [`InventoryError::BoxNotEmpty`] when the box still lists books.
    pub fn delete_box(&self, box_id: BoxId) -> InventoryResult<()> {
        let result = self.repo.atomically(|store| -> InventoryResult<()> {
            let record = require_box(store, box_id)?;
            if !record.is_empty() {
                return Err(InventoryError::BoxNotEmpty(box_id));
            }
            if !store.delete_box(box_id)? {
                return Err(InventoryError::BoxNotFound(box_id));
            }
            Ok(())
        });
        log_outcome("box_delete", result, || format!("box_id={box_id}"))
    }

    /// Creates an unstored book.
    pub fn create_book(&self, input: NewBook) -> InventoryResult<BookRecord> {
        let record = self.new_book(input)?;
        let result = self.repo.atomically(|store| -> InventoryResult<BookRecord> {
            store.put_book(&record)?;
            Ok(record)
        });
        log_outcome("book_create", result, String::new)
    }

    /// Creates a book and links it to `box_id` in one unit.
    ///
    /// # Errors
    /// - [`InventoryError::BoxNotFound`]
    /// - [`InventoryError::BoxFull`]
    /// - [`InventoryError::InvalidInput`]
    pub fn create_book_in_box(&self, box_id: BoxId, input: NewBook) -> InventoryResult<BookRecord> {
        let mut book = self.new_book(input)?;
        let result = self.repo.atomically(|store| -> InventoryResult<BookRecord> {
            let mut record = require_box(store, box_id)?;
            if record.is_full() {
                return Err(InventoryError::BoxFull(box_id));
            }

            book.status = BookStatus::Stored;
            record.contents.push(book.id);
            record.updated_at = Some(self.touch(record.created_at));

            store.put_book(&book)?;
            store.put_box(&record)?;
            Ok(book)
        });
        log_outcome("book_create_in_box", result, || format!("box_id={box_id}"))
    }

    /// Replaces the descriptive fields present in `patch`.
    ///
    /// An empty patch still refreshes `updated_at`.
    pub fn update_book(&self, book_id: BookId, patch: &BookPatch) -> InventoryResult<BookRecord> {
        let result = self.repo.atomically(|store| -> InventoryResult<BookRecord> {
            let mut record = require_book(store, book_id)?;
            patch.apply_to(&mut record);
            record.updated_at = Some(self.touch(record.created_at));
            record.validate().map_err(InventoryError::InvalidInput)?;
            store.put_book(&record)?;
            Ok(record)
        });
        log_outcome("book_update", result, || format!("book_id={book_id}"))
    }

    /// Deletes an unstored book.
    ///
    /// # Errors
    /// - [`InventoryError::BookNotFound`]
    /// - [`InventoryError::BookStillStored`] when the book is linked to a box.
    pub fn delete_book(&self, book_id: BookId) -> InventoryResult<()> {
        let result = self.repo.atomically(|store| -> InventoryResult<()> {
            let record = require_book(store, book_id)?;
            if record.is_stored() {
                return Err(InventoryError::BookStillStored(book_id));
            }
            if !store.delete_book(book_id)? {
                return Err(InventoryError::BookNotFound(book_id));
            }
            Ok(())
        });
        log_outcome("book_delete", result, || format!("book_id={book_id}"))
    }

    /// Links an existing unstored book to a box.
    ///
    /// Checks run in order: existence, already in this box, stored elsewhere,
    /// capacity.
    pub fn add_book_to_box(&self, box_id: BoxId, book_id: BookId) -> InventoryResult<()> {
        let result = self.repo.atomically(|store| -> InventoryResult<()> {
            let mut record = require_box(store, box_id)?;
            let mut book = require_book(store, book_id)?;

            if record.contains(book_id) {
                return Err(InventoryError::AlreadyLinked { box_id, book_id });
            }
            if book.is_stored() {
                return Err(InventoryError::BookAlreadyStored(book_id));
            }
            if record.is_full() {
                return Err(InventoryError::BoxFull(box_id));
            }

            record.contents.push(book_id);
            record.updated_at = Some(self.touch(record.created_at));
            book.status = BookStatus::Stored;
            book.updated_at = Some(self.touch(book.created_at));

            store.put_box(&record)?;
            store.put_book(&book)?;
            Ok(())
        });
        log_outcome("book_add", result, || {
            format!("box_id={box_id} book_id={book_id}")
        })
    }

    /// Unlinks a book from the box that lists it.
    pub fn remove_book_from_box(&self, box_id: BoxId, book_id: BookId) -> InventoryResult<()> {
        let result = self.repo.atomically(|store| -> InventoryResult<()> {
            let mut record = require_box(store, box_id)?;
            let mut book = require_book(store, book_id)?;

            if !record.contains(book_id) {
                return Err(InventoryError::NotLinked { box_id, book_id });
            }

            record.contents.retain(|id| *id != book_id);
            record.updated_at = Some(self.touch(record.created_at));
            book.status = BookStatus::Unstored;
            book.updated_at = Some(self.touch(book.created_at));

            store.put_box(&record)?;
            store.put_book(&book)?;
            Ok(())
        });
        log_outcome("book_remove", result, || {
            format!("box_id={box_id} book_id={book_id}")
        })
    }

    /// Lists every box ordered by `created_at ASC, id ASC`.
    pub fn list_boxes(&self) -> InventoryResult<Vec<BoxRecord>> {
        Ok(self.repo.list_boxes()?)
    }

    /// Lists every book ordered by `created_at ASC, id ASC`.
    pub fn list_books(&self) -> InventoryResult<Vec<BookRecord>> {
        Ok(self.repo.list_books()?)
    }

    pub fn get_box(&self, box_id: BoxId) -> InventoryResult<BoxRecord> {
        require_box(&self.repo, box_id)
    }

    pub fn get_book(&self, book_id: BookId) -> InventoryResult<BookRecord> {
        require_book(&self.repo, book_id)
    }

    /// Returns the id of the box that stores `book_id`.
    ///
    /// Scans boxes linearly and stops at the first match.
    ///
    /// # Errors
    /// - [`InventoryError::BookNotFound`]
    /// - [`InventoryError::NotStored`] when the book is unstored.
    /// - [`InventoryError::InconsistentState`] when a stored book has no box.
    pub fn locate_book(&self, book_id: BookId) -> InventoryResult<BoxId> {
        self.repo.atomically(|store| -> InventoryResult<BoxId> {
            let book = require_book(store, book_id)?;
            if !book.is_stored() {
                return Err(InventoryError::NotStored(book_id));
            }

            store
                .list_boxes()?
                .into_iter()
                .find(|record| record.contains(book_id))
                .map(|record| record.id)
                .ok_or_else(|| {
                    InventoryError::InconsistentState(format!(
                        "book {book_id} is marked stored but no box lists it"
                    ))
                })
        })
    }

    fn new_book(&self, input: NewBook) -> InventoryResult<BookRecord> {
        let input = NewBook {
            title: input.title.trim().to_string(),
            ..input
        };
        let record = BookRecord::new(input, self.clock.now_ms());
        record.validate().map_err(InventoryError::InvalidInput)?;
        Ok(record)
    }

    /// Mutation timestamp, never earlier than `created_at`.
    fn touch(&self, created_at: i64) -> i64 {
        self.clock.now_ms().max(created_at)
    }
}

fn require_box(store: &(impl InventoryStore + ?Sized), box_id: BoxId) -> InventoryResult<BoxRecord> {
    store
        .get_box(box_id)?
        .ok_or(InventoryError::BoxNotFound(box_id))
}

fn require_book(
    store: &(impl InventoryStore + ?Sized),
    book_id: BookId,
) -> InventoryResult<BookRecord> {
    store
        .get_book(book_id)?
        .ok_or(InventoryError::BookNotFound(book_id))
}

fn log_outcome<T>(
    event: &str,
    result: InventoryResult<T>,
    fields: impl FnOnce() -> String,
) -> InventoryResult<T> {
    match &result {
        Ok(_) => info!("event={event} module=service status=ok {}", fields()),
        Err(err) if err.kind() == ErrorKind::InfrastructureFailure => warn!(
            "event={event} module=service status=error error_code={} {} error={}",
            err.code(),
            fields(),
            err
        ),
        Err(err) => info!(
            "event={event} module=service status=rejected error_code={} {}",
            err.code(),
            fields()
        ),
    }
    result
}
