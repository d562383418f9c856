//! Audit trail of credential operations, kept in `<data_dir>/audit.db`.
//!
//! Rows name the user, the credential and what happened to it.  Values and
//! key material are never recorded.
//!
//! Auditing must not block the operation being audited: if the database
//! cannot be opened or written, a `tracing` warning is emitted and the
//! caller carries on.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::warn;

use crate::errors::{CredVaultError, Result};
use crate::vault::store::{open_sqlite, timestamp_column};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS audit_events (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at  TEXT NOT NULL,
    action       TEXT NOT NULL,
    user_id      TEXT NOT NULL,
    credential   TEXT,
    detail       TEXT
);";

const SELECT_RECENT: &str = "SELECT seq, recorded_at, action, user_id, credential, detail
     FROM audit_events ORDER BY seq DESC LIMIT ?1";

const SELECT_SINCE: &str = "SELECT seq, recorded_at, action, user_id, credential, detail
     FROM audit_events WHERE recorded_at >= ?2 ORDER BY seq DESC LIMIT ?1";

/// One recorded operation.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub user_id: String,
    pub credential: Option<String>,
    pub details: Option<String>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: timestamp_column(row, 1)?,
            operation: row.get(2)?,
            user_id: row.get(3)?,
            credential: row.get(4)?,
            details: row.get(5)?,
        })
    }
}

pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open the audit database under `data_dir`, or `None` (with a warning)
    /// when it is unavailable.
    pub fn open(data_dir: &Path) -> Option<Self> {
        let path = Self::db_path(data_dir);
        match Self::try_open(&path) {
            Ok(log) => Some(log),
            Err(e) => {
                warn!(path = %path.display(), kind = e.kind(), error = %e, "audit log unavailable");
                None
            }
        }
    }

    fn try_open(path: &Path) -> Result<Self> {
        let conn = open_sqlite(path)?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| CredVaultError::Audit(format!("create schema: {e}")))?;
        Ok(Self { conn })
    }

    /// Append an event.  Write failures are traced, never returned.
    pub fn log(
        &self,
        operation: &str,
        user_id: &str,
        credential: Option<&str>,
        details: Option<&str>,
    ) {
        let written = self.conn.execute(
            "INSERT INTO audit_events (recorded_at, action, user_id, credential, detail)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![Utc::now().to_rfc3339(), operation, user_id, credential, details],
        );
        if let Err(e) = written {
            warn!(operation, error = %e, "failed to write audit entry");
        }
    }

    /// Most recent entries first, at most `limit`, optionally only those
    /// recorded at or after `since`.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = if since.is_some() { SELECT_SINCE } else { SELECT_RECENT };

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| CredVaultError::Audit(format!("query prepare: {e}")))?;

        let rows = match since {
            Some(ts) => stmt.query_map(params![limit, ts.to_rfc3339()], AuditEntry::from_row),
            None => stmt.query_map(params![limit], AuditEntry::from_row),
        }
        .map_err(|e| CredVaultError::Audit(format!("query exec: {e}")))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| CredVaultError::Audit(format!("row parse: {e}")))
    }

    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join("audit.db")
    }
}
