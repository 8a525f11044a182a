//! Process configuration for inventory entry points.
//!
//! # Responsibility
//! - Resolve database location and logging settings from the environment.
//! - Open the configured SQLite database and start logging.
//!
//! # Invariants
//! - Blank values behave exactly like unset variables.
//! - Logging stays disabled unless a log directory is configured.

use boxbook_core::db::{open_db, open_db_in_memory, DbResult};
use boxbook_core::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "BOXBOOK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "BOXBOOK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "BOXBOOK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "boxbook.sqlite3";
const IN_MEMORY_DB: &str = ":memory:";

/// Where the inventory database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Throwaway database dropped with its connection.
    Memory,
}

impl DbLocation {
    fn parse(raw: &str) -> Self {
        if raw == IN_MEMORY_DB {
            Self::Memory
        } else {
            Self::File(PathBuf::from(raw))
        }
    }

    fn default_file() -> Self {
        Self::File(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub db: DbLocation,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl ApiConfig {
    /// Reads `BOXBOOK_DB_PATH`, `BOXBOOK_LOG_LEVEL` and `BOXBOOK_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| non_blank(lookup(key));
        Self {
            db: value(DB_PATH_ENV)
                .map(|raw| DbLocation::parse(&raw))
                .unwrap_or_else(DbLocation::default_file),
            log_level: value(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value(LOG_DIR_ENV),
        }
    }

    /// Applies explicit values on top of the current config. Blank values are ignored.
    pub fn with_overrides(
        mut self,
        db: Option<String>,
        log_level: Option<String>,
        log_dir: Option<String>,
    ) -> Self {
        if let Some(raw) = non_blank(db) {
            self.db = DbLocation::parse(&raw);
        }
        if let Some(level) = non_blank(log_level) {
            self.log_level = level;
        }
        if let Some(dir) = non_blank(log_dir) {
            self.log_dir = Some(dir);
        }
        self
    }

    /// Opens and migrates the configured database.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match &self.db {
            DbLocation::File(path) => open_db(path),
            DbLocation::Memory => open_db_in_memory(),
        }
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging is disabled.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match &self.log_dir {
            Some(dir) => init_logging(&self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
