//! `credvault set` — add or update a credential.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::{output, Context};
use crate::errors::{CredVaultError, Result};
use crate::gate::credential_label;

/// Execute the `set` command.
pub fn execute(ctx: &Context, name: &str, value: Option<&str>) -> Result<()> {
    // Fail on a bad key before asking the user to type anything.
    let vault = ctx.open_vault()?;

    let secret_value = if let Some(v) = value {
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        let entered = dialoguer::Password::new()
            .with_prompt(format!("Enter your {}", credential_label(name)))
            .allow_empty_password(true)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))?;
        Zeroizing::new(entered)
    };

    let existed = vault.set_credential(&ctx.user, name, &secret_value)?;

    let detail = if secret_value.trim().is_empty() {
        "cleared"
    } else if existed {
        "updated"
    } else {
        "added"
    };
    ctx.audit("set", Some(name), Some(detail));

    output::success(&format!(
        "Credential '{name}' {detail} for user '{}'.",
        ctx.user
    ));
    if detail == "cleared" {
        output::tip("Jobs that require it will be refused until it is set again.");
    }

    Ok(())
}
