//! Request-shaped inventory API.
//!
//! # Responsibility
//! - Accept string identifiers and plain inputs from outer surfaces.
//! - Translate service outcomes into `{ "status": code, ...data }` envelopes.
//!
//! # Invariants
//! - Every failure kind maps to exactly one status code.
//! - Identifiers that are not UUIDs are treated as unresolvable (`404`).
//! - No call panics; serialization failures become `500` envelopes.

use boxbook_core::{
    BookId, BookPatch, BoxId, Clock, ErrorKind, InventoryError, InventoryRepository,
    InventoryService, NewBook, SystemClock,
};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Response envelope returned by every [`InventoryApi`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Data fields merged next to `status` when rendered.
    pub body: Map<String, Value>,
}

impl ApiResponse {
    fn with_field(status: u16, key: &str, value: Value) -> Self {
        let mut body = Map::new();
        body.insert(key.to_string(), value);
        Self { status, body }
    }

    fn message(message: impl Into<String>) -> Self {
        Self::with_field(STATUS_OK, "message", Value::String(message.into()))
    }

    fn data(status: u16, key: &str, value: &impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::with_field(status, key, value),
            Err(err) => {
                warn!("event=api_encode module=api status=error key={key} error={err}");
                Self::failure(
                    STATUS_INTERNAL_ERROR,
                    "encoding_failure",
                    format!("failed to encode `{key}`"),
                )
            }
        }
    }

    fn failure(status: u16, code: &str, message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(message.into()));
        body.insert("error_code".to_string(), Value::String(code.to_string()));
        Self { status, body }
    }

    fn from_error(err: &InventoryError) -> Self {
        Self::failure(status_for(err.kind()), err.code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Renders the envelope as a single JSON object.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("status".to_string(), Value::from(self.status));
        for (key, value) in &self.body {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// Maps a failure kind to its response status.
pub fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::NotFound | ErrorKind::NotStored => STATUS_NOT_FOUND,
        ErrorKind::ConflictOfState | ErrorKind::CapacityExceeded | ErrorKind::InvalidInput => {
            STATUS_BAD_REQUEST
        }
        ErrorKind::InfrastructureFailure => STATUS_INTERNAL_ERROR,
    }
}

/// String-id facade over [`InventoryService`].
pub struct InventoryApi<R: InventoryRepository, C: Clock = SystemClock> {
    service: InventoryService<R, C>,
}

impl<R: InventoryRepository, C: Clock> InventoryApi<R, C> {
    pub fn new(service: InventoryService<R, C>) -> Self {
        Self { service }
    }

    pub fn create_box(&self, name: &str) -> ApiResponse {
        match self.service.create_box(name) {
            Ok(record) => ApiResponse::data(STATUS_CREATED, "box", &record),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn list_boxes(&self) -> ApiResponse {
        match self.service.list_boxes() {
            Ok(boxes) => ApiResponse::data(STATUS_OK, "boxes", &boxes),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn get_box(&self, box_id: &str) -> ApiResponse {
        let box_id = match parse_box_id(box_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.get_box(box_id) {
            Ok(record) => ApiResponse::data(STATUS_OK, "box", &record),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn update_box(&self, box_id: &str, name: &str) -> ApiResponse {
        let box_id = match parse_box_id(box_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.update_box(box_id, name) {
            Ok(_) => ApiResponse::message(format!("Box {box_id} updated.")),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn delete_box(&self, box_id: &str) -> ApiResponse {
        let box_id = match parse_box_id(box_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.delete_box(box_id) {
            Ok(()) => ApiResponse::message(format!("Box {box_id} deleted.")),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    /// Creates a book that is not stored in any box.
    pub fn create_book(&self, input: NewBook) -> ApiResponse {
        match self.service.create_book(input) {
            Ok(record) => ApiResponse::data(STATUS_CREATED, "book", &record),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn create_book_in_box(&self, box_id: &str, input: NewBook) -> ApiResponse {
        let box_id = match parse_box_id(box_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.create_book_in_box(box_id, input) {
            Ok(record) => ApiResponse::data(STATUS_CREATED, "book", &record),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn add_book_to_box(&self, box_id: &str, book_id: &str) -> ApiResponse {
        let (box_id, book_id) = match parse_pair(box_id, book_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };
        match self.service.add_book_to_box(box_id, book_id) {
            Ok(()) => ApiResponse::message(format!("Book {book_id} added to box {box_id}.")),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn remove_book_from_box(&self, box_id: &str, book_id: &str) -> ApiResponse {
        let (box_id, book_id) = match parse_pair(box_id, book_id) {
            Ok(ids) => ids,
            Err(response) => return response,
        };
        match self.service.remove_book_from_box(box_id, book_id) {
            Ok(()) => ApiResponse::message(format!("Book {book_id} removed from box {box_id}.")),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn list_books(&self) -> ApiResponse {
        match self.service.list_books() {
            Ok(books) => ApiResponse::data(STATUS_OK, "books", &books),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn get_book(&self, book_id: &str) -> ApiResponse {
        let book_id = match parse_book_id(book_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.get_book(book_id) {
            Ok(record) => ApiResponse::data(STATUS_OK, "book", &record),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn update_book(&self, book_id: &str, patch: &BookPatch) -> ApiResponse {
        let book_id = match parse_book_id(book_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.update_book(book_id, patch) {
            Ok(_) => ApiResponse::message(format!("Book {book_id} updated.")),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    /// Applies a JSON object of descriptive fields to a book.
    ///
    /// Unknown keys, including `status`, are rejected with `400`.
    pub fn update_book_json(&self, book_id: &str, patch_json: &str) -> ApiResponse {
        match serde_json::from_str::<BookPatch>(patch_json) {
            Ok(patch) => self.update_book(book_id, &patch),
            Err(err) => ApiResponse::failure(
                STATUS_BAD_REQUEST,
                "invalid_input",
                format!("invalid book fields: {err}"),
            ),
        }
    }

    pub fn delete_book(&self, book_id: &str) -> ApiResponse {
        let book_id = match parse_book_id(book_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.delete_book(book_id) {
            Ok(()) => ApiResponse::message(format!("Book {book_id} deleted.")),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    pub fn locate_book(&self, book_id: &str) -> ApiResponse {
        let book_id = match parse_book_id(book_id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        match self.service.locate_book(book_id) {
            Ok(box_id) => {
                ApiResponse::with_field(STATUS_OK, "box_id", Value::String(box_id.to_string()))
            }
            Err(err) => ApiResponse::from_error(&err),
        }
    }
}

fn parse_box_id(raw: &str) -> Result<BoxId, ApiResponse> {
    parse_id(raw, "box_not_found", "box")
}

fn parse_book_id(raw: &str) -> Result<BookId, ApiResponse> {
    parse_id(raw, "book_not_found", "book")
}

fn parse_pair(box_id: &str, book_id: &str) -> Result<(BoxId, BookId), ApiResponse> {
    Ok((parse_box_id(box_id)?, parse_book_id(book_id)?))
}

fn parse_id(raw: &str, code: &str, entity: &str) -> Result<Uuid, ApiResponse> {
    let trimmed = raw.trim();
    Uuid::parse_str(trimmed).map_err(|_| {
        debug!("event=api_parse_id module=api status=rejected entity={entity}");
        ApiResponse::failure(STATUS_NOT_FOUND, code, format!("{entity} not found: {trimmed}"))
    })
}

#[cfg(test)]
mod tests {
    use super::{status_for, ApiResponse, InventoryApi, STATUS_NOT_FOUND};
    use boxbook_core::{
        ErrorKind, InventoryService, ManualClock, MemoryInventoryRepository, NewBook,
    };
    use serde_json::json;

    fn api() -> InventoryApi<MemoryInventoryRepository, ManualClock> {
        InventoryApi::new(InventoryService::with_clock(
            MemoryInventoryRepository::new(),
            ManualClock::new(1_000),
        ))
    }

    fn field<'a>(response: &'a ApiResponse, key: &str) -> &'a serde_json::Value {
        response
            .body
            .get(key)
            .unwrap_or_else(|| panic!("missing `{key}` in {:?}", response.body))
    }

    #[test]
    fn status_mapping_is_fixed_per_kind() {
        assert_eq!(status_for(ErrorKind::NotFound), 404);
        assert_eq!(status_for(ErrorKind::NotStored), 404);
        assert_eq!(status_for(ErrorKind::ConflictOfState), 400);
        assert_eq!(status_for(ErrorKind::CapacityExceeded), 400);
        assert_eq!(status_for(ErrorKind::InvalidInput), 400);
        assert_eq!(status_for(ErrorKind::InfrastructureFailure), 500);
    }

    #[test]
    fn envelope_puts_status_next_to_data() {
        let response = api().create_box("Shelf1");
        let rendered = response.to_json();
        assert_eq!(rendered["status"], json!(201));
        assert_eq!(rendered["box"]["name"], json!("Shelf1"));
        assert_eq!(rendered["box"]["contents"], json!([]));
    }

    #[test]
    fn malformed_ids_are_not_found() {
        let api = api();
        let response = api.get_box("not-a-uuid");
        assert_eq!(response.status, STATUS_NOT_FOUND);
        assert_eq!(field(&response, "error_code"), "box_not_found");

        let response = api.locate_book("");
        assert_eq!(response.status, STATUS_NOT_FOUND);
        assert_eq!(field(&response, "error_code"), "book_not_found");
    }

    #[test]
    fn update_book_json_rejects_status_field() {
        let api = api();
        let created = api.create_book(NewBook {
            title: "K2".to_string(),
            description: String::new(),
            author: String::new(),
            price: 1.0,
        });
        let book_id = field(&created, "book")["id"].as_str().unwrap().to_string();

        let response = api.update_book_json(&book_id, r#"{"status":"stored"}"#);
        assert_eq!(response.status, 400);
        assert_eq!(field(&response, "error_code"), "invalid_input");

        let response = api.update_book_json(&book_id, r#"{"author":"Someone"}"#);
        assert_eq!(response.status, 200);
        assert_eq!(
            field(&api.get_book(&book_id), "book")["author"],
            json!("Someone")
        );
    }
}
