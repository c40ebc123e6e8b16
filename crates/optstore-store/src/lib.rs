//! optstore store - SQLite persistence for options
//!
//! Provides:
//! - Connection management (`db`)
//! - Embedded, checksummed schema migrations
//! - `SqliteEngine`, the `PersistenceEngine` backed by the `options` table

pub mod db;
pub mod engine;
pub mod errors;
pub mod migrations;

// Re-export key types
pub use engine::SqliteEngine;
pub use errors::Result;
