use std::{collections::BTreeMap, sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, atomic::{AtomicI64, Ordering}}};

use finledger_core::{check_date, Category, Entry, EntryCommand, EntryFilter, EntryId};

// Re-export core storage types so existing code using crate::storage::* still works
pub use finledger_core::storage::{StorageBackend, StorageError};

#[derive(Default)]
struct Tables {
    entries: BTreeMap<EntryId, Entry>,
    categories: BTreeMap<Arc<str>, i64>,
}

/// Non-persistent backend with the same semantics as the SQLite store.
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
    entry_counter: AtomicI64,
    category_counter: AtomicI64,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            entry_counter: AtomicI64::new(1),
            category_counter: AtomicI64::new(1),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables.read().map_err(|e| StorageError::Other(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables.write().map_err(|e| StorageError::Other(e.to_string()))
    }
}

fn entry_from_command(id: EntryId, command: &EntryCommand) -> Entry {
    Entry {
        id,
        entry_date: command.entry_date,
        description: command.description.clone(),
        amount: command.amount,
        category: command.category.clone(),
        entry_type: command.entry_type.clone(),
    }
}

impl StorageBackend for InMemoryStorage {
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, StorageError> {
        let tables = self.read()?;
        let mut result: Vec<Entry> = tables.entries.values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.entry_date.cmp(&a.entry_date).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    fn get_entry(&self, id: EntryId) -> Result<Entry, StorageError> {
        self.read()?.entries.get(&id)
            .cloned()
            .ok_or(StorageError::EntryNotFound(id))
    }

    fn create_entry(&self, command: &EntryCommand) -> Result<EntryId, StorageError> {
        check_date(command.entry_date)?;
        let mut tables = self.write()?;
        let id = self.entry_counter.fetch_add(1, Ordering::SeqCst);
        tables.entries.insert(id, entry_from_command(id, command));
        tracing::debug!(id, "Entry created");
        Ok(id)
    }

    fn update_entry(&self, id: EntryId, command: &EntryCommand) -> Result<(), StorageError> {
        check_date(command.entry_date)?;
        let mut tables = self.write()?;
        let slot = tables.entries.get_mut(&id)
            .ok_or(StorageError::EntryNotFound(id))?;
        *slot = entry_from_command(id, command);
        tracing::debug!(id, "Entry updated");
        Ok(())
    }

    fn delete_entry(&self, id: EntryId) -> Result<(), StorageError> {
        let mut tables = self.write()?;
        tables.entries.remove(&id)
            .ok_or(StorageError::EntryNotFound(id))?;
        tracing::debug!(id, "Entry deleted");
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        // BTreeMap keys are already in name order
        Ok(self.read()?.categories.iter()
            .map(|(name, id)| Category { id: *id, name: name.clone() })
            .collect())
    }

    fn create_category(&self, name: &str) -> Result<bool, StorageError> {
        let mut tables = self.write()?;
        if tables.categories.contains_key(name) {
            return Ok(false);
        }
        let id = self.category_counter.fetch_add(1, Ordering::SeqCst);
        tables.categories.insert(Arc::from(name), id);
        Ok(true)
    }
}
