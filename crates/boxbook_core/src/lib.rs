//! Core domain logic for the BoxBook inventory.
//! This crate is the single source of truth for box/book invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{BookId, BookPatch, BookRecord, BookStatus, NewBook};
pub use model::box_record::{BoxId, BoxRecord, BOX_CAPACITY};
pub use model::validation::RecordValidationError;
pub use repo::inventory_repo::{InventoryRepository, InventoryStore, RepoError, RepoResult};
pub use repo::memory_repo::MemoryInventoryRepository;
pub use repo::sqlite_repo::SqliteInventoryRepository;
pub use service::inventory_service::{
    ErrorKind, InventoryError, InventoryResult, InventoryService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
