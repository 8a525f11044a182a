//! Outer-surface API for the BoxBook inventory.
//!
//! Wraps `boxbook_core` services with string identifiers, status-coded
//! envelopes and environment configuration.

pub mod api;
pub mod config;

pub use api::{status_for, ApiResponse, InventoryApi};
pub use config::{ApiConfig, DbLocation};
