//! `credvault delete` — remove a credential.

use dialoguer::Confirm;

use crate::cli::{output, Context};
use crate::errors::{CredVaultError, Result};

/// Execute the `delete` command.
pub fn execute(ctx: &Context, name: &str, force: bool) -> Result<()> {
    let vault = ctx.open_vault()?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete credential '{name}' for user '{}'?",
                ctx.user
            ))
            .default(false)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            return Err(CredVaultError::UserCancelled);
        }
    }

    vault.delete_credential(&ctx.user, name)?;
    ctx.audit("delete", Some(name), None);

    output::success(&format!(
        "Credential '{name}' deleted for user '{}'.",
        ctx.user
    ));
    Ok(())
}
