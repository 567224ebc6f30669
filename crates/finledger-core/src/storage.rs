use crate::models::{read::EntryFilter, write::EntryCommand, Category, DateError, Entry, EntryId};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(String),
    #[error("invalid stored data: {0}")]
    InvalidData(String),
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),
    #[error("{0}")]
    Other(String),
}

impl From<DateError> for StorageError {
    fn from(e: DateError) -> Self {
        StorageError::InvalidData(e.to_string())
    }
}

pub trait StorageBackend: Send + Sync {
    // Entries
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, StorageError>;
    fn get_entry(&self, id: EntryId) -> Result<Entry, StorageError>;
    fn create_entry(&self, command: &EntryCommand) -> Result<EntryId, StorageError>;
    fn update_entry(&self, id: EntryId, command: &EntryCommand) -> Result<(), StorageError>;
    fn delete_entry(&self, id: EntryId) -> Result<(), StorageError>;

    // Categories
    fn list_categories(&self) -> Result<Vec<Category>, StorageError>;
    /// Returns `false` when the name already exists; the table is left unchanged.
    fn create_category(&self, name: &str) -> Result<bool, StorageError>;
}
