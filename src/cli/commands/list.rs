//! `credvault list` — show which credentials a user has, never their values.

use crate::cli::{output, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let vault = ctx.open_vault()?;
    let credentials = vault.list_credentials(&ctx.user)?;
    output::print_credentials_table(&ctx.user, &credentials);
    Ok(())
}
