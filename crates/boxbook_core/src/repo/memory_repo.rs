//! Process-local inventory repository.
//!
//! # Responsibility
//! - Back the inventory service with plain maps for tests and embedding.
//!
//! # Invariants
//! - A unit of work holds the store write lock for its whole duration.
//! - Writes inside a unit are staged and applied only when the unit succeeds.
//! - Readers take the read lock and only see committed state.

use super::inventory_repo::{InventoryRepository, InventoryStore, RepoError, RepoResult};
use super::{sort_books, sort_boxes};
use crate::model::book::{BookId, BookRecord};
use crate::model::box_record::{BoxId, BoxRecord};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    boxes: HashMap<BoxId, BoxRecord>,
    books: HashMap<BookId, BookRecord>,
}

/// In-memory inventory repository.
#[derive(Debug, Default)]
pub struct MemoryInventoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| RepoError::LockPoisoned)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| RepoError::LockPoisoned)
    }
}

impl InventoryStore for MemoryInventoryRepository {
    fn get_box(&self, id: BoxId) -> RepoResult<Option<BoxRecord>> {
        Ok(self.read()?.boxes.get(&id).cloned())
    }

    fn put_box(&self, record: &BoxRecord) -> RepoResult<()> {
        record.validate()?;
        let mut state = self.write()?;
        let stored = preserve_box_created_at(state.boxes.get(&record.id), record);
        state.boxes.insert(record.id, stored);
        Ok(())
    }

    fn delete_box(&self, id: BoxId) -> RepoResult<bool> {
        Ok(self.write()?.boxes.remove(&id).is_some())
    }

    fn list_boxes(&self) -> RepoResult<Vec<BoxRecord>> {
        let mut boxes = self.read()?.boxes.values().cloned().collect::<Vec<_>>();
        sort_boxes(&mut boxes);
        Ok(boxes)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<BookRecord>> {
        Ok(self.read()?.books.get(&id).cloned())
    }

    fn put_book(&self, record: &BookRecord) -> RepoResult<()> {
        record.validate()?;
        let mut state = self.write()?;
        let stored = preserve_book_created_at(state.books.get(&record.id), record);
        state.books.insert(record.id, stored);
        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<bool> {
        Ok(self.write()?.books.remove(&id).is_some())
    }

    fn list_books(&self) -> RepoResult<Vec<BookRecord>> {
        let mut books = self.read()?.books.values().cloned().collect::<Vec<_>>();
        sort_books(&mut books);
        Ok(books)
    }
}

impl InventoryRepository for MemoryInventoryRepository {
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn InventoryStore) -> Result<T, E>,
        E: From<RepoError>,
    {
        let mut state = self.write()?;

        let staged = StagedStore::new(&state);
        let outcome = f(&staged);
        let writes = staged.into_writes();

        if outcome.is_ok() {
            writes.apply(&mut state);
        }
        outcome
    }
}

/// Pending writes keyed by id. `None` marks a deletion.
#[derive(Default)]
struct WriteSet {
    boxes: HashMap<BoxId, Option<BoxRecord>>,
    books: HashMap<BookId, Option<BookRecord>>,
}

impl WriteSet {
    fn apply(self, state: &mut MemoryState) {
        for (id, record) in self.boxes {
            match record {
                Some(record) => {
                    state.boxes.insert(id, record);
                }
                None => {
                    state.boxes.remove(&id);
                }
            }
        }
        for (id, record) in self.books {
            match record {
                Some(record) => {
                    state.books.insert(id, record);
                }
                None => {
                    state.books.remove(&id);
                }
            }
        }
    }
}

/// Read-your-writes overlay over committed state.
struct StagedStore<'a> {
    base: &'a MemoryState,
    writes: RefCell<WriteSet>,
}

impl<'a> StagedStore<'a> {
    fn new(base: &'a MemoryState) -> Self {
        Self {
            base,
            writes: RefCell::new(WriteSet::default()),
        }
    }

    fn into_writes(self) -> WriteSet {
        self.writes.into_inner()
    }
}

impl InventoryStore for StagedStore<'_> {
    fn get_box(&self, id: BoxId) -> RepoResult<Option<BoxRecord>> {
        match self.writes.borrow().boxes.get(&id) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.base.boxes.get(&id).cloned()),
        }
    }

    fn put_box(&self, record: &BoxRecord) -> RepoResult<()> {
        record.validate()?;
        let current = self.get_box(record.id)?;
        let stored = preserve_box_created_at(current.as_ref(), record);
        self.writes.borrow_mut().boxes.insert(record.id, Some(stored));
        Ok(())
    }

    fn delete_box(&self, id: BoxId) -> RepoResult<bool> {
        let existed = self.get_box(id)?.is_some();
        if existed {
            self.writes.borrow_mut().boxes.insert(id, None);
        }
        Ok(existed)
    }

    fn list_boxes(&self) -> RepoResult<Vec<BoxRecord>> {
        let writes = self.writes.borrow();
        let mut boxes = self
            .base
            .boxes
            .values()
            .filter(|record| !writes.boxes.contains_key(&record.id))
            .cloned()
            .chain(writes.boxes.values().flatten().cloned())
            .collect::<Vec<_>>();
        sort_boxes(&mut boxes);
        Ok(boxes)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<BookRecord>> {
        match self.writes.borrow().books.get(&id) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.base.books.get(&id).cloned()),
        }
    }

    fn put_book(&self, record: &BookRecord) -> RepoResult<()> {
        record.validate()?;
        let current = self.get_book(record.id)?;
        let stored = preserve_book_created_at(current.as_ref(), record);
        self.writes.borrow_mut().books.insert(record.id, Some(stored));
        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<bool> {
        let existed = self.get_book(id)?.is_some();
        if existed {
            self.writes.borrow_mut().books.insert(id, None);
        }
        Ok(existed)
    }

    fn list_books(&self) -> RepoResult<Vec<BookRecord>> {
        let writes = self.writes.borrow();
        let mut books = self
            .base
            .books
            .values()
            .filter(|record| !writes.books.contains_key(&record.id))
            .cloned()
            .chain(writes.books.values().flatten().cloned())
            .collect::<Vec<_>>();
        sort_books(&mut books);
        Ok(books)
    }
}

fn preserve_box_created_at(current: Option<&BoxRecord>, record: &BoxRecord) -> BoxRecord {
    let mut stored = record.clone();
    if let Some(current) = current {
        stored.created_at = current.created_at;
    }
    stored
}

fn preserve_book_created_at(current: Option<&BookRecord>, record: &BookRecord) -> BookRecord {
    let mut stored = record.clone();
    if let Some(current) = current {
        stored.created_at = current.created_at;
    }
    stored
}
