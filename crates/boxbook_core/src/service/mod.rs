//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage adapter calls into use-case level APIs.
//! - Keep boundary layers decoupled from storage details.

pub mod inventory_service;
