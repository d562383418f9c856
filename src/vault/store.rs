//! Storage collaborators for encoded credential values.
//!
//! A store persists the text it is given verbatim and returns it
//! verbatim.  It knows nothing about encryption; `CredentialVault` does
//! the encoding before calling `put` and the decoding after `get`.
//!
//! Two implementations:
//! - `SqliteStore`: one SQLite file, the default for the CLI.
//! - `MemoryStore`: a map behind a lock, for tests and embedding.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::credential::{CredentialMetadata, StoredCredential};
use crate::errors::{CredVaultError, Result};

/// Storage collaborator for encoded credential values.
pub trait CredentialStore: Send + Sync {
    /// Fetch one record, or `None` if the user never stored that name.
    fn get(&self, user_id: &str, name: &str) -> Result<Option<StoredCredential>>;

    /// Insert or replace a value.  Returns `true` if a record already existed.
    ///
    /// An existing record keeps its original `created_at`.
    fn put(&self, user_id: &str, name: &str, value: &str) -> Result<bool>;

    /// Remove a record.  Returns `false` if there was nothing to remove.
    fn delete(&self, user_id: &str, name: &str) -> Result<bool>;

    /// Metadata for one user's credentials, sorted by name.
    fn list(&self, user_id: &str) -> Result<Vec<CredentialMetadata>>;

    /// Every record of every user, ordered by user then name.
    fn all_records(&self) -> Result<Vec<StoredCredential>>;
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// SQLite-backed credential store.
///
/// The connection sits behind a `Mutex` so the store can be shared
/// between threads.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// Creates the parent directory if needed and, on Unix, restricts the
    /// file to owner-only access.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_sqlite(path)?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        debug!(path = %path.display(), "credential store opened");
        Ok(store)
    }

    /// An in-memory SQLite database (tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CredVaultError::Storage(format!("open in-memory: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Path of the database file, if it is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> Result<()> {
        self.lock()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS credentials (
                    user_id     TEXT NOT NULL,
                    name        TEXT NOT NULL,
                    value       TEXT NOT NULL,
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL,
                    PRIMARY KEY (user_id, name)
                );",
            )
            .map_err(|e| CredVaultError::Storage(format!("create schema: {e}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CredVaultError::Storage("connection lock poisoned".into()))
    }
}

/// Open (or create) a SQLite file readable only by its owner.
///
/// Shared by the credential store and the audit log.  Creates the parent
/// directory if needed.
pub(crate) fn open_sqlite(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)
        .map_err(|e| CredVaultError::Storage(format!("open {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(conn)
}

/// Read an RFC 3339 timestamp column.  A value that does not parse is a
/// conversion error, not a substitute time.
pub(crate) fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredCredential> {
    Ok(StoredCredential {
        user_id: row.get(0)?,
        name: row.get(1)?,
        value: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
        updated_at: timestamp_column(row, 4)?,
    })
}

impl CredentialStore for SqliteStore {
    fn get(&self, user_id: &str, name: &str) -> Result<Option<StoredCredential>> {
        self.lock()?
            .query_row(
                "SELECT user_id, name, value, created_at, updated_at
                 FROM credentials WHERE user_id = ?1 AND name = ?2",
                params![user_id, name],
                row_to_record,
            )
            .optional()
            .map_err(|e| CredVaultError::Storage(format!("get: {e}")))
    }

    fn put(&self, user_id: &str, name: &str, value: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;

        let existed = conn
            .query_row(
                "SELECT 1 FROM credentials WHERE user_id = ?1 AND name = ?2",
                params![user_id, name],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| CredVaultError::Storage(format!("put lookup: {e}")))?
            .is_some();

        conn.execute(
            "INSERT INTO credentials (user_id, name, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (user_id, name)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![user_id, name, value, now],
        )
        .map_err(|e| CredVaultError::Storage(format!("put: {e}")))?;

        Ok(existed)
    }

    fn delete(&self, user_id: &str, name: &str) -> Result<bool> {
        let removed = self
            .lock()?
            .execute(
                "DELETE FROM credentials WHERE user_id = ?1 AND name = ?2",
                params![user_id, name],
            )
            .map_err(|e| CredVaultError::Storage(format!("delete: {e}")))?;
        Ok(removed > 0)
    }

    fn list(&self, user_id: &str) -> Result<Vec<CredentialMetadata>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, name, value, created_at, updated_at
                 FROM credentials WHERE user_id = ?1 ORDER BY name",
            )
            .map_err(|e| CredVaultError::Storage(format!("list prepare: {e}")))?;

        let rows = stmt
            .query_map(params![user_id], row_to_record)
            .map_err(|e| CredVaultError::Storage(format!("list exec: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let record = row.map_err(|e| CredVaultError::Storage(format!("row parse: {e}")))?;
            out.push(CredentialMetadata::from(&record));
        }
        Ok(out)
    }

    fn all_records(&self) -> Result<Vec<StoredCredential>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, name, value, created_at, updated_at
                 FROM credentials ORDER BY user_id, name",
            )
            .map_err(|e| CredVaultError::Storage(format!("scan prepare: {e}")))?;

        let rows = stmt
            .query_map([], row_to_record)
            .map_err(|e| CredVaultError::Storage(format!("scan exec: {e}")))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| CredVaultError::Storage(format!("row parse: {e}")))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(String, String), StoredCredential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> CredVaultError {
    CredVaultError::Storage("memory store lock poisoned".into())
}

impl CredentialStore for MemoryStore {
    fn get(&self, user_id: &str, name: &str) -> Result<Option<StoredCredential>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .get(&(user_id.to_string(), name.to_string()))
            .cloned())
    }

    fn put(&self, user_id: &str, name: &str, value: &str) -> Result<bool> {
        let now = Utc::now();
        let mut records = self.records.write().map_err(poisoned)?;
        let key = (user_id.to_string(), name.to_string());

        // If the record already exists, preserve the original created_at.
        let existing = records.get(&key).map(|r| r.created_at);
        records.insert(
            key,
            StoredCredential {
                user_id: user_id.to_string(),
                name: name.to_string(),
                value: value.to_string(),
                created_at: existing.unwrap_or(now),
                updated_at: now,
            },
        );
        Ok(existing.is_some())
    }

    fn delete(&self, user_id: &str, name: &str) -> Result<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        Ok(records
            .remove(&(user_id.to_string(), name.to_string()))
            .is_some())
    }

    fn list(&self, user_id: &str) -> Result<Vec<CredentialMetadata>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .values()
            .filter(|r| r.user_id == user_id)
            .map(CredentialMetadata::from)
            .collect())
    }

    fn all_records(&self) -> Result<Vec<StoredCredential>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.values().cloned().collect())
    }
}
