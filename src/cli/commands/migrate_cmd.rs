//! `credvault migrate` — encrypt legacy plaintext values in place.
//!
//! Usage:
//!   credvault migrate --dry-run   # show what would change
//!   credvault migrate             # encrypt legacy values

use crate::cli::{output, Context};
use crate::errors::{CredVaultError, Result};
use crate::migrate::migrate_legacy_values;

/// Execute the `migrate` command.
pub fn execute(ctx: &Context, dry_run: bool, json: bool) -> Result<()> {
    let vault = ctx.open_vault()?;
    let report = migrate_legacy_values(&vault, dry_run)?;

    if !dry_run {
        ctx.audit(
            "migrate",
            None,
            Some(&format!(
                "{} migrated, {} failed",
                report.migrated.len(),
                report.failed.len()
            )),
        );
    }

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CredVaultError::Serialization(e.to_string()))?;
        println!("{text}");
    } else {
        output::print_migration_report(&report);
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(CredVaultError::CommandFailed(format!(
            "{} record(s) could not be migrated",
            report.failed.len()
        )))
    }
}
