//! Key-value preference persistence.
//!
//! # Responsibility
//! - Back the narrow `PreferenceStore` collaborator with the `preferences`
//!   table.
//!
//! # Invariants
//! - Values are unsigned 32-bit integers; anything else in storage is
//!   reported as invalid data instead of being truncated.

use crate::config::PreferenceStore;
use crate::repo::note_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite-backed preference store.
pub struct SqlitePreferenceStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferenceStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PreferenceStore for SqlitePreferenceStore<'_> {
    fn load_u32(&self, key: &str) -> RepoResult<Option<u32>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|raw| {
                u32::try_from(raw).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "preference `{key}` holds out-of-range value {raw}"
                    ))
                })
            })
            .transpose()
    }

    fn save_u32(&self, key: &str, value: u32) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, i64::from(value)],
        )?;
        Ok(())
    }
}
