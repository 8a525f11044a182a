//! SQLite-backed inventory repository.
//!
//! # Responsibility
//! - Persist boxes, books and box membership in the migrated ledger schema.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Box membership is stored as `box_contents` rows ordered by `position`.
//! - Multi-statement writes run inside a transaction, reusing the caller's
//!   transaction when one is already open.
//! - Read paths reject invalid persisted state instead of masking it.

use super::inventory_repo::{InventoryRepository, InventoryStore, RepoError, RepoResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::book::{BookId, BookRecord, BookStatus};
use crate::model::box_record::{BoxId, BoxRecord};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use uuid::Uuid;

const BOX_SELECT_SQL: &str = "SELECT
    box_uuid,
    name,
    created_at,
    updated_at
FROM boxes";

const BOOK_SELECT_SQL: &str = "SELECT
    book_uuid,
    title,
    description,
    author,
    price,
    status,
    created_at,
    updated_at
FROM books";

/// SQLite-backed inventory repository.
pub struct SqliteInventoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInventoryRepository<'conn> {
    /// Creates repository from a migrated connection.
    ///
    /// # Errors
    /// - [`RepoError::UninitializedConnection`] when migrations were not applied.
    /// - [`RepoError::MissingRequiredTable`] when the schema is incomplete.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_inventory_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl InventoryStore for SqliteInventoryRepository<'_> {
    fn get_box(&self, id: BoxId) -> RepoResult<Option<BoxRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOX_SELECT_SQL} WHERE box_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut record = parse_box_row(row)?;
        record.contents = load_box_contents(self.conn, id)?;
        record.validate()?;
        Ok(Some(record))
    }

    fn put_box(&self, record: &BoxRecord) -> RepoResult<()> {
        record.validate()?;

        with_write_scope(self.conn, |conn| {
            conn.execute(
                "INSERT INTO boxes (box_uuid, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(box_uuid) DO UPDATE SET
                    name = excluded.name,
                    updated_at = excluded.updated_at;",
                params![
                    record.id.to_string(),
                    record.name.as_str(),
                    record.created_at,
                    record.updated_at,
                ],
            )?;

            conn.execute(
                "DELETE FROM box_contents WHERE box_uuid = ?1;",
                [record.id.to_string()],
            )?;
            for (position, book_id) in record.contents.iter().enumerate() {
                conn.execute(
                    "INSERT INTO box_contents (box_uuid, book_uuid, position)
                     VALUES (?1, ?2, ?3);",
                    params![record.id.to_string(), book_id.to_string(), position as i64],
                )?;
            }
            Ok(())
        })
    }

    fn delete_box(&self, id: BoxId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM boxes WHERE box_uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn list_boxes(&self) -> RepoResult<Vec<BoxRecord>> {
        let mut contents_by_box = load_all_box_contents(self.conn)?;

        let mut stmt = self.conn.prepare(&format!(
            "{BOX_SELECT_SQL} ORDER BY created_at ASC, box_uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut boxes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = parse_box_row(row)?;
            record.contents = contents_by_box.remove(&record.id).unwrap_or_default();
            record.validate()?;
            boxes.push(record);
        }

        Ok(boxes)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<BookRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE book_uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_book_row(row)),
            )
            .optional()?
            .transpose()?;

        if let Some(record) = &record {
            record.validate()?;
        }
        Ok(record)
    }

    fn put_book(&self, record: &BookRecord) -> RepoResult<()> {
        record.validate()?;

        self.conn.execute(
            "INSERT INTO books (
                book_uuid,
                title,
                description,
                author,
                price,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(book_uuid) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                author = excluded.author,
                price = excluded.price,
                status = excluded.status,
                updated_at = excluded.updated_at;",
            params![
                record.id.to_string(),
                record.title.as_str(),
                record.description.as_str(),
                record.author.as_str(),
                record.price,
                book_status_to_db(record.status),
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE book_uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn list_books(&self) -> RepoResult<Vec<BookRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOOK_SELECT_SQL} ORDER BY created_at ASC, book_uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            let record = parse_book_row(row)?;
            record.validate()?;
            books.push(record);
        }
        Ok(books)
    }
}

impl InventoryRepository for SqliteInventoryRepository<'_> {
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn InventoryStore) -> Result<T, E>,
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;

        match f(self) {
            Ok(value) => {
                tx.commit().map_err(RepoError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=tx_rollback module=repo status=error error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

fn with_write_scope<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    if !conn.is_autocommit() {
        return f(conn);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

fn load_box_contents(conn: &Connection, box_id: BoxId) -> RepoResult<Vec<BookId>> {
    let mut stmt = conn.prepare(
        "SELECT book_uuid
         FROM box_contents
         WHERE box_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([box_id.to_string()])?;
    let mut contents = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        contents.push(parse_uuid(&value, "box_contents.book_uuid")?);
    }
    Ok(contents)
}

fn load_all_box_contents(conn: &Connection) -> RepoResult<HashMap<BoxId, Vec<BookId>>> {
    let mut stmt = conn.prepare(
        "SELECT box_uuid, book_uuid
         FROM box_contents
         ORDER BY box_uuid ASC, position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut contents: HashMap<BoxId, Vec<BookId>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let box_text: String = row.get(0)?;
        let book_text: String = row.get(1)?;
        contents
            .entry(parse_uuid(&box_text, "box_contents.box_uuid")?)
            .or_default()
            .push(parse_uuid(&book_text, "box_contents.book_uuid")?);
    }
    Ok(contents)
}

fn parse_box_row(row: &Row<'_>) -> RepoResult<BoxRecord> {
    let id_text: String = row.get("box_uuid")?;
    Ok(BoxRecord {
        id: parse_uuid(&id_text, "boxes.box_uuid")?,
        name: row.get("name")?,
        contents: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<BookRecord> {
    let id_text: String = row.get("book_uuid")?;
    let status_text: String = row.get("status")?;
    let status = parse_book_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid book status `{status_text}` in books.status"))
    })?;

    Ok(BookRecord {
        id: parse_uuid(&id_text, "books.book_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        author: row.get("author")?,
        price: row.get("price")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn book_status_to_db(status: BookStatus) -> &'static str {
    match status {
        BookStatus::Stored => "stored",
        BookStatus::Unstored => "unstored",
    }
}

fn parse_book_status(value: &str) -> Option<BookStatus> {
    match value {
        "stored" => Some(BookStatus::Stored),
        "unstored" => Some(BookStatus::Unstored),
        _ => None,
    }
}

fn ensure_inventory_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["boxes", "books", "box_contents"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{parse_book_status, SqliteInventoryRepository};
    use crate::db::open_db_in_memory;
    use crate::model::book::BookStatus;
    use crate::repo::inventory_repo::RepoError;
    use rusqlite::Connection;

    #[test]
    fn parse_book_status_is_case_sensitive() {
        assert_eq!(parse_book_status("stored"), Some(BookStatus::Stored));
        assert_eq!(parse_book_status("Stored"), None);
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().expect("open raw connection");
        let err = SqliteInventoryRepository::try_new(&conn)
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn try_new_accepts_migrated_connection() {
        let conn = open_db_in_memory().expect("open migrated connection");
        assert!(SqliteInventoryRepository::try_new(&conn).is_ok());
    }
}
