//! SQLite-backed key-value store
//!
//! Rows live in the `kv_store` table created by migration v1.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::backend::{KeyValueStore, KvWrite};
use super::error::StoreResult;
use crate::db::{migrations, Database};

/// Durable store over the tracker database
#[derive(Clone)]
pub struct SqliteStore {
    database: Database,
}

impl SqliteStore {
    /// Wrap an already migrated database
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Open the database file, running migrations first
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let database = Database::new(path)?;
        database.with_conn(migrations::run_migrations)?;
        Ok(Self::new(database))
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

fn apply(conn: &Connection, write: &KvWrite) -> rusqlite::Result<()> {
    match write {
        KvWrite::Set { key, value } => {
            conn.execute(
                r#"
                INSERT INTO kv_store (key, value)
                VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = datetime('now')
                "#,
                params![key, value],
            )?;
        }
        KvWrite::Remove { key } => {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        }
    }
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self.database.with_conn(|conn| {
            let value: Option<String> = conn
                .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.write_batch(&[KvWrite::set(key, value)])
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.write_batch(&[KvWrite::remove(key)])
    }

    /// All writes land in one transaction
    fn write_batch(&self, writes: &[KvWrite]) -> StoreResult<()> {
        self.database.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for write in writes {
                apply(&tx, write)?;
            }
            tx.commit()?;
            Ok(())
        })?;
        Ok(())
    }
}
