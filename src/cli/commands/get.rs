//! `credvault get` — print a single credential's decrypted value.

use crate::cli::Context;
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(ctx: &Context, name: &str) -> Result<()> {
    let vault = ctx.open_vault()?;

    let value = match vault.require_credential(&ctx.user, name) {
        Ok(value) => value,
        Err(e) => {
            if e.is_decryption_failure() {
                ctx.audit("read-failed", Some(name), Some(e.kind()));
            }
            return Err(e);
        }
    };

    println!("{}", value.as_str());
    Ok(())
}
