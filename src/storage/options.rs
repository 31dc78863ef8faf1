use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use mockall::automock;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use crate::storage::{OptionScope, StorageError};

/// Key/value option storage, scoped to a site or a network
#[cfg_attr(test, automock)]
pub trait OptionStore: Send + Sync {
    /// Get an option value, or None if it is not set
    fn get_option(&self, scope: OptionScope, key: &str) -> Result<Option<Value>, StorageError>;

    /// Insert or replace an option value
    fn update_option(
        &self,
        scope: OptionScope,
        key: &str,
        value: &Value,
    ) -> Result<(), StorageError>;

    /// Delete an option. Returns true if something was deleted.
    fn delete_option(&self, scope: OptionScope, key: &str) -> Result<bool, StorageError>;

    /// List every scope holding a value for `key`, ordered by scope kind then id
    fn scopes_with_option(&self, key: &str) -> Result<Vec<OptionScope>, StorageError>;
}

pub struct SqliteOptionStore {
    conn: Mutex<Connection>,
}

impl SqliteOptionStore {
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        info!("Initializing options database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(conn),
        };

        store.create_schema()?;
        debug!("Options database ready");

        Ok(store)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        debug!("Creating options schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scope TEXT NOT NULL,
                scope_id INTEGER NOT NULL,
                option_key TEXT NOT NULL,
                option_value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(scope, scope_id, option_key)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_option_key ON options(option_key)",
            [],
        )?;

        Ok(())
    }
}

impl OptionStore for SqliteOptionStore {
    fn get_option(&self, scope: OptionScope, key: &str) -> Result<Option<Value>, StorageError> {
        let conn = self.lock_conn()?;
        let raw: Option<String> = conn
            .query_row(
                r#"
                SELECT option_value FROM options
                WHERE scope = ?1 AND scope_id = ?2 AND option_key = ?3
                "#,
                (scope.kind(), scope.id() as i64, key),
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StorageError::from)
    }

    fn update_option(
        &self,
        scope: OptionScope,
        key: &str,
        value: &Value,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO options (scope, scope_id, option_key, option_value, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(scope, scope_id, option_key)
            DO UPDATE SET option_value = excluded.option_value, updated_at = excluded.updated_at
            "#,
            (
                scope.kind(),
                scope.id() as i64,
                key,
                raw,
                Self::current_timestamp_ms(),
            ),
        )?;

        debug!("Updated option {} in {}", key, scope);
        Ok(())
    }

    fn delete_option(&self, scope: OptionScope, key: &str) -> Result<bool, StorageError> {
        let conn = self.lock_conn()?;
        let deleted = conn.execute(
            "DELETE FROM options WHERE scope = ?1 AND scope_id = ?2 AND option_key = ?3",
            (scope.kind(), scope.id() as i64, key),
        )?;

        if deleted > 0 {
            debug!("Deleted option {} from {}", key, scope);
        }
        Ok(deleted > 0)
    }

    fn scopes_with_option(&self, key: &str) -> Result<Vec<OptionScope>, StorageError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT scope, scope_id FROM options
            WHERE option_key = ?1
            ORDER BY scope, scope_id
            "#,
        )?;

        let rows = stmt
            .query_map([key], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(kind, id)| OptionScope::from_parts(&kind, id as u64))
            .collect())
    }
}
