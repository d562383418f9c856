//! `credvault verify` — decrypt every stored record and report failures.

use comfy_table::{ContentArrangement, Table};

use crate::cli::{output, Context};
use crate::errors::{CredVaultError, Result};

/// Execute the `verify` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let vault = ctx.open_vault()?;
    let outcomes = vault.verify_all()?;

    let failures: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    if failures.is_empty() {
        output::success(&format!(
            "All {} stored credential(s) decrypt with the current key.",
            outcomes.len()
        ));
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["User", "Credential", "Failure"]);
    for outcome in &failures {
        let kind = outcome.error.as_ref().map_or("-", |e| e.kind());
        table.add_row(vec![outcome.user_id.clone(), outcome.name.clone(), kind.to_string()]);
    }
    println!("{table}");

    output::tip("Affected users need to re-enter these credentials.");
    ctx.audit(
        "verify",
        None,
        Some(&format!("{} of {} failed", failures.len(), outcomes.len())),
    );

    Err(CredVaultError::CommandFailed(format!(
        "{} of {} stored credential(s) failed verification",
        failures.len(),
        outcomes.len()
    )))
}
