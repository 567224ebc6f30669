use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use finledger_core::{check_date, format_date, parse_date, Category, Entry, EntryCommand, EntryFilter, EntryId, EntryType};
use rust_decimal::Decimal;
use rusqlite::{params, params_from_iter, Connection, ErrorCode};

use crate::storage::{StorageBackend, StorageError};

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

fn sqlite_error(e: rusqlite::Error) -> StorageError {
    StorageError::Sqlite(e.to_string())
}

impl SqliteStorage {
    /// Opens (or creates) the store at `path`. `:memory:` gives a private in-memory database.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(path)
        }
        .map_err(sqlite_error)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(sqlite_error)?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        tracing::info!(path, "SQLite store opened");
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|e| StorageError::Other(e.to_string()))
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_date TEXT NOT NULL,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                category TEXT NOT NULL,
                entry_type TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_date
                ON entries(entry_date);

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            );
            ",
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn entry_exists(conn: &Connection, id: EntryId) -> Result<bool, StorageError> {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM entries WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .map_err(sqlite_error)
    }
}

type EntryRow = (i64, String, String, String, String, String);

fn map_entry_row(row: &rusqlite::Row) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn entry_from_row((id, date, description, amount, category, entry_type): EntryRow) -> Result<Entry, StorageError> {
    let entry_date = parse_date(&date)
        .map_err(|e| StorageError::InvalidData(format!("entry {} date '{}': {}", id, date, e)))?;
    let amount = Decimal::from_str(&amount)
        .map_err(|e| StorageError::InvalidData(format!("entry {} amount '{}': {}", id, amount, e)))?;
    Ok(Entry {
        id,
        entry_date,
        description: Arc::from(description.as_str()),
        amount,
        category: Arc::from(category.as_str()),
        entry_type: EntryType::from(entry_type.as_str()),
    })
}

impl StorageBackend for SqliteStorage {
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, StorageError> {
        let conn = self.conn()?;

        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(category) = &filter.category {
            args.push(category.to_string());
            clauses.push(format!("category = ?{}", args.len()));
        }
        if let Some(start) = filter.start_date {
            args.push(format_date(start));
            clauses.push(format!("entry_date >= ?{}", args.len()));
        }
        if let Some(end) = filter.end_date {
            args.push(format_date(end));
            clauses.push(format!("entry_date <= ?{}", args.len()));
        }

        let mut query = String::from(
            "SELECT id, entry_date, description, amount, category, entry_type FROM entries",
        );
        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(" ORDER BY entry_date DESC, id DESC");

        let mut stmt = conn.prepare(&query).map_err(sqlite_error)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), map_entry_row)
            .map_err(sqlite_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sqlite_error)?;

        rows.into_iter().map(entry_from_row).collect()
    }

    fn get_entry(&self, id: EntryId) -> Result<Entry, StorageError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, entry_date, description, amount, category, entry_type FROM entries WHERE id = ?1",
                params![id],
                map_entry_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::EntryNotFound(id),
                _ => sqlite_error(e),
            })?;
        entry_from_row(row)
    }

    fn create_entry(&self, command: &EntryCommand) -> Result<EntryId, StorageError> {
        check_date(command.entry_date)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO entries (entry_date, description, amount, category, entry_type) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                format_date(command.entry_date),
                command.description.as_ref(),
                command.amount.to_string(),
                command.category.as_ref(),
                command.entry_type.as_str()
            ],
        )
        .map_err(sqlite_error)?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, "Entry created");
        Ok(id)
    }

    fn update_entry(&self, id: EntryId, command: &EntryCommand) -> Result<(), StorageError> {
        check_date(command.entry_date)?;
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE entries SET entry_date = ?1, description = ?2, amount = ?3, category = ?4, entry_type = ?5 WHERE id = ?6",
                params![
                    format_date(command.entry_date),
                    command.description.as_ref(),
                    command.amount.to_string(),
                    command.category.as_ref(),
                    command.entry_type.as_str(),
                    id
                ],
            )
            .map_err(sqlite_error)?;
        if changed == 0 {
            return Err(StorageError::EntryNotFound(id));
        }
        tracing::debug!(id, "Entry updated");
        Ok(())
    }

    fn delete_entry(&self, id: EntryId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        if !Self::entry_exists(&conn, id)? {
            return Err(StorageError::EntryNotFound(id));
        }
        conn.execute("DELETE FROM entries WHERE id = ?1", params![id])
            .map_err(sqlite_error)?;
        tracing::debug!(id, "Entry deleted");
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name FROM categories ORDER BY name")
            .map_err(sqlite_error)?;
        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let name: String = row.get(1)?;
                Ok(Category { id, name: Arc::from(name.as_str()) })
            })
            .map_err(sqlite_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_error)
    }

    fn create_category(&self, name: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        match conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name]) {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                tracing::debug!(name, "Category already exists");
                Ok(false)
            }
            Err(e) => Err(sqlite_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::date;

    fn command(date: time::Date, amount: Decimal, category: &str, entry_type: EntryType) -> EntryCommand {
        EntryCommand {
            entry_date: date,
            description: Arc::from("Groceries"),
            amount,
            category: Arc::from(category),
            entry_type,
        }
    }

    #[test]
    fn test_sqlite_entry_roundtrip() {
        let storage = SqliteStorage::new(":memory:").unwrap();

        let id = storage
            .create_entry(&command(date!(2024 - 02 - 29), dec!(-12.35), "Food", EntryType::BankTransaction))
            .unwrap();
        let entry = storage.get_entry(id).unwrap();

        assert_eq!(entry.entry_date, date!(2024 - 02 - 29));
        assert_eq!(entry.amount, dec!(-12.35));
        assert_eq!(entry.category.as_ref(), "Food");
        assert_eq!(entry.entry_type, EntryType::BankTransaction);

        let other = storage
            .create_entry(&command(date!(2024 - 03 - 01), dec!(5), "Misc", EntryType::from("Liability")))
            .unwrap();
        assert_eq!(
            storage.get_entry(other).unwrap().entry_type,
            EntryType::Other(Arc::from("Liability"))
        );
    }

    #[test]
    fn test_sqlite_filters() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        storage.create_entry(&command(date!(2024 - 01 - 01), dec!(-10), "Food", EntryType::Cash)).unwrap();
        storage.create_entry(&command(date!(2024 - 01 - 15), dec!(-20), "Food", EntryType::Cash)).unwrap();
        storage.create_entry(&command(date!(2024 - 01 - 31), dec!(-30), "Rent", EntryType::Cash)).unwrap();
        storage.create_entry(&command(date!(2024 - 02 - 01), dec!(-40), "Food", EntryType::Cash)).unwrap();

        let january = storage
            .list_entries(&EntryFilter {
                category: None,
                start_date: Some(date!(2024 - 01 - 01)),
                end_date: Some(date!(2024 - 01 - 31)),
            })
            .unwrap();
        let amounts: Vec<_> = january.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![dec!(-30), dec!(-20), dec!(-10)]);

        let food_from_mid_jan = storage
            .list_entries(&EntryFilter {
                category: Some(Arc::from("Food")),
                start_date: Some(date!(2024 - 01 - 15)),
                end_date: None,
            })
            .unwrap();
        let amounts: Vec<_> = food_from_mid_jan.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![dec!(-40), dec!(-20)]);
    }

    #[test]
    fn test_sqlite_update_delete() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let id = storage
            .create_entry(&command(date!(2024 - 01 - 01), dec!(100), "Salary", EntryType::BankTransaction))
            .unwrap();

        storage
            .update_entry(id, &command(date!(2024 - 01 - 02), dec!(150), "Salary", EntryType::BankTransaction))
            .unwrap();
        assert_eq!(storage.get_entry(id).unwrap().amount, dec!(150));

        let missing = command(date!(2024 - 01 - 02), dec!(1), "X", EntryType::Cash);
        assert!(matches!(storage.update_entry(id + 1, &missing), Err(StorageError::EntryNotFound(_))));
        assert!(matches!(storage.delete_entry(id + 1), Err(StorageError::EntryNotFound(_))));
        assert_eq!(storage.list_entries(&EntryFilter::default()).unwrap().len(), 1);

        storage.delete_entry(id).unwrap();
        assert!(matches!(storage.get_entry(id), Err(StorageError::EntryNotFound(_))));
    }

    #[test]
    fn test_sqlite_rejects_unstorable_year() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let id = storage
            .create_entry(&command(date!(2024 - 01 - 01), dec!(1), "Food", EntryType::Cash))
            .unwrap();

        let bc = time::Date::from_calendar_date(-1, time::Month::January, 1).unwrap();
        let bad = command(bc, dec!(1), "Food", EntryType::Cash);
        assert!(matches!(storage.create_entry(&bad), Err(StorageError::InvalidData(_))));
        assert!(matches!(storage.update_entry(id, &bad), Err(StorageError::InvalidData(_))));

        let entries = storage.list_entries(&EntryFilter::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_date, date!(2024 - 01 - 01));
    }

    #[test]
    fn test_sqlite_duplicate_category() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        assert!(storage.create_category("Utilities").unwrap());
        assert!(storage.create_category("Food").unwrap());
        assert!(!storage.create_category("Food").unwrap());

        let categories = storage.list_categories().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name.as_ref(), "Food");
        assert_eq!(categories[1].name.as_ref(), "Utilities");
    }
}
