//! SQLite-backed durable cache tier
//!
//! Rows are keyed `aircheck:<normalized key>` and hold the JSON-serialized
//! cache entry, so a result survives between runs until its TTL passes.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::CacheEntry;
use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 2;

/// Prefix applied to every stored key
pub const KEY_PREFIX: &str = "aircheck:";

type Result<T> = std::result::Result<T, CacheError>;

fn storage_key(key: &str) -> String {
    format!("{}{}", KEY_PREFIX, key)
}

/// SQLite-backed cache storage
pub struct CacheStorage {
    conn: Connection,
    db_path: PathBuf,
}

impl CacheStorage {
    /// Open or create cache storage at the default XDG cache location
    pub fn open() -> Result<Self> {
        let cache_dir = Self::cache_dir()?;
        Self::open_at(&cache_dir)
    }

    /// Get the cache directory path (~/.cache/aircheck on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("aircheck"))
    }

    /// Open cache storage at a specific directory
    pub fn open_at(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            Self::nuke(&db_path)?;
            return Self::open_at(cache_dir);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                entry TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                last_accessed_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expires_at ON cache_entries(expires_at);
            CREATE INDEX IF NOT EXISTS idx_last_accessed_at ON cache_entries(last_accessed_at);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self { conn, db_path })
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get an entry if it has not expired at `now`
    pub fn get<V: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry<V>>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT entry FROM cache_entries
                 WHERE cache_key = ?1 AND expires_at >= ?2",
                params![storage_key(key), now.timestamp_millis()],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store an entry, replacing any previous one for the same key
    pub fn put<V: Serialize>(&self, entry: &CacheEntry<V>) -> Result<()> {
        let json = serde_json::to_string(entry)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO cache_entries
             (cache_key, entry, created_at, expires_at, last_accessed_at, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                storage_key(&entry.key),
                json,
                entry.created_at.timestamp_millis(),
                entry.expires_at.timestamp_millis(),
                entry.last_accessed_at.timestamp_millis(),
                json.len()
            ],
        )?;
        Ok(())
    }

    /// Record a read of `key` at `at` for LRU trimming
    pub fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE cache_entries SET last_accessed_at = ?2 WHERE cache_key = ?1",
            params![storage_key(key), at.timestamp_millis()],
        )?;
        Ok(updated > 0)
    }

    /// Keep only the `capacity` most recently accessed entries.
    /// Returns how many were removed.
    pub fn trim_to(&self, capacity: usize) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM cache_entries WHERE cache_key NOT IN (
                SELECT cache_key FROM cache_entries
                ORDER BY last_accessed_at DESC, created_at DESC
                LIMIT ?1
             )",
            [capacity as i64],
        )?;
        Ok(deleted)
    }

    /// Delete a specific cache entry by key
    pub fn delete(&self, key: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM cache_entries WHERE cache_key = ?1",
            [storage_key(key)],
        )?;
        Ok(deleted > 0)
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<ClearStats> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        self.conn.execute("DELETE FROM cache_entries", [])?;

        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }

    /// Delete every entry that expired before `now`
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM cache_entries WHERE expires_at < ?1",
            [now.timestamp_millis()],
        )?;
        Ok(deleted)
    }

    /// Get cache statistics
    pub fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats> {
        let now = now.timestamp_millis();

        let total_entries: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        let valid_entries: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE expires_at >= ?1",
            [now],
            |r| r.get(0),
        )?;

        let total_size: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_entries",
            [],
            |r| r.get(0),
        )?;

        let oldest: Option<i64> = self
            .conn
            .query_row(
                "SELECT MIN(created_at) FROM cache_entries WHERE expires_at >= ?1",
                [now],
                |r| r.get(0),
            )
            .optional()?
            .flatten();

        let newest: Option<i64> = self
            .conn
            .query_row(
                "SELECT MAX(created_at) FROM cache_entries WHERE expires_at >= ?1",
                [now],
                |r| r.get(0),
            )
            .optional()?
            .flatten();

        Ok(CacheStats {
            total_entries: total_entries as usize,
            valid_entries: valid_entries as usize,
            expired_entries: (total_entries - valid_entries) as usize,
            total_size_bytes: total_size as usize,
            oldest_entry: oldest.and_then(DateTime::from_timestamp_millis),
            newest_entry: newest.and_then(DateTime::from_timestamp_millis),
        })
    }

    /// Nuke the cache database
    fn nuke(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
        }
        Ok(())
    }
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state
#[derive(Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}
