//! One-time migration of legacy plaintext credential values.
//!
//! Older rows hold API keys as plaintext.  The migration walks every
//! stored record, skips the ones that are empty or already look encoded,
//! and rewrites the rest in encrypted form through the store.
//!
//! "Looks encoded" is a heuristic (`vault::looks_encoded`): it is good
//! enough to make the migration re-runnable, not to make security
//! decisions.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::Result;
use crate::vault::{looks_encoded, CredentialStore, CredentialVault};

/// One `(user_id, credential name)` pair.  Never carries a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordId {
    pub user_id: String,
    pub name: String,
}

/// Report of what the migration did.
#[derive(Debug, Default, Serialize)]
pub struct MigrationReport {
    /// Records encrypted and rewritten (or that would be, in a dry run).
    pub migrated: Vec<RecordId>,
    /// Records already in encoded form.
    pub skipped: Vec<RecordId>,
    /// Records with an empty value ("not set"); left untouched.
    pub empty: Vec<RecordId>,
    /// Records that could not be migrated, with the error kind.
    pub failed: Vec<(RecordId, String)>,
    /// True when nothing was written.
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Encrypt every legacy plaintext value held by the vault's store.
///
/// With `dry_run` set, records are classified but nothing is written.
/// A failure on one record is reported and the migration continues.
pub fn migrate_legacy_values<S: CredentialStore>(
    vault: &CredentialVault<S>,
    dry_run: bool,
) -> Result<MigrationReport> {
    let mut report = MigrationReport {
        dry_run,
        ..MigrationReport::default()
    };

    let records = vault.store().all_records()?;
    info!(records = records.len(), dry_run, "starting legacy credential migration");

    for record in records {
        let id = RecordId {
            user_id: record.user_id.clone(),
            name: record.name.clone(),
        };

        if record.value.is_empty() {
            report.empty.push(id);
            continue;
        }

        if looks_encoded(&record.value) {
            report.skipped.push(id);
            continue;
        }

        if dry_run {
            report.migrated.push(id);
            continue;
        }

        let outcome = vault
            .cipher()
            .encrypt(&record.value)
            .and_then(|encoded| vault.put_encoded(&record.user_id, &record.name, &encoded));

        match outcome {
            Ok(_) => {
                info!(user_id = %id.user_id, credential = %id.name, "encrypted legacy credential");
                report.migrated.push(id);
            }
            Err(e) => {
                warn!(
                    user_id = %id.user_id,
                    credential = %id.name,
                    kind = e.kind(),
                    "failed to migrate legacy credential"
                );
                report.failed.push((id, e.kind().to_string()));
            }
        }
    }

    info!(
        migrated = report.migrated.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "legacy credential migration finished"
    );
    Ok(report)
}
