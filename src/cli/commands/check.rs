//! `credvault check` — run the validation gate for a user.
//!
//! Exit status is non-zero when anything is missing, so scripts can use
//! it as a preflight before starting a job.

use crate::cli::{output, Context};
use crate::errors::{CredVaultError, Result};
use crate::gate::check_required_credentials;

/// Execute the `check` command.
pub fn execute(ctx: &Context, require: &[String], json: bool) -> Result<()> {
    let required: &[String] = if require.is_empty() {
        &ctx.settings.required_credentials
    } else {
        require
    };

    let vault = ctx.open_vault()?;
    let credentials = vault.load_credential_set(&ctx.user, required)?;
    let result = check_required_credentials(&credentials, required);

    if json {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| CredVaultError::Serialization(e.to_string()))?;
        println!("{text}");
    } else {
        output::print_validation(&ctx.user, &result);
    }

    result.into_result()
}
