use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::app_dirs::AppDirs;

pub const TIMER_SETTINGS_KEY: &str = "timerSettings";
pub const EDITOR_SETTINGS_KEY: &str = "editorSettings";
pub const EDITOR_DOCUMENTS_KEY: &str = "editorDocuments";
pub const LAYOUT_LEFT_WIDTH_KEY: &str = "layoutLeftWidth";
pub const THEME_KEY: &str = "timerTheme";
pub const LANGUAGE_KEY: &str = "appLanguage";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat string blobs addressed by key, the only persistence the app has.
/// Writes are last-write-wins and nothing spans more than one key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// SQLite-backed key-value table
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at the default state path, creating it if needed
    pub fn open_default() -> Result<Self, StorageError> {
        let path = AppDirs::storage_path().unwrap_or_else(|| PathBuf::from("lectern_storage.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        Ok(SqliteStore { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}

/// In-memory store for tests and `--storage :memory:` runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sqlite_set_get_overwrite() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap(), None);

        store.set(THEME_KEY, "light").unwrap();
        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn sqlite_remove_and_clear() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        store.remove("a").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn sqlite_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set(LAYOUT_LEFT_WIDTH_KEY, "42.5").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get(LAYOUT_LEFT_WIDTH_KEY).unwrap().as_deref(),
            Some("42.5")
        );
    }

    #[test]
    fn memory_store_keys_are_sorted() {
        let store = MemoryStore::new();
        store.set("zeta", "1").unwrap();
        store.set("alpha", "2").unwrap();
        assert_eq!(
            store.keys().unwrap(),
            vec!["alpha".to_string(), "zeta".to_string()]
        );
    }
}
