pub mod charts;
pub mod config;
pub mod forms;
pub mod render;
pub mod report;
pub mod sqlite_storage;
pub mod storage;
pub mod web;

use std::sync::Arc;

use config::{DatabaseConfig, StorageKind};
use sqlite_storage::SqliteStorage;
use storage::{InMemoryStorage, StorageBackend, StorageError};

/// Opens the backend selected by the `[database]` config section.
pub fn open_storage(config: &DatabaseConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match config.backend {
        StorageKind::Sqlite => Ok(Arc::new(SqliteStorage::new(&config.path)?)),
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage; entries are lost on exit");
            Ok(Arc::new(InMemoryStorage::new()))
        }
    }
}
