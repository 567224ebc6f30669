//! Core types and traits for finledger storage backends.
//!
//! This crate provides the `StorageBackend` trait and the ledger models,
//! so the web layer and the storage implementations agree on one vocabulary.

pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use models::{Category, DateError, Entry, EntryId, EntryType, check_date, parse_date, format_date};
pub use models::write::EntryCommand;
pub use models::read::EntryFilter;
pub use storage::{StorageBackend, StorageError};
