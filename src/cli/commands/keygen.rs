//! `credvault keygen` — print a fresh random master key.
//!
//! The key goes to stdout on its own so it can be piped straight into a
//! secret manager; hints go to stderr.

use console::style;

use crate::cli::Context;
use crate::crypto::generate_master_key_hex;
use crate::errors::Result;

/// Execute the `keygen` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let key = generate_master_key_hex()?;
    println!("{}", key.as_str());

    eprintln!(
        "{} Store this in {} and keep it out of version control.",
        style("\u{2192}").dim(),
        style(&ctx.settings.master_key_env).bold()
    );
    eprintln!(
        "{} Losing it makes every stored credential unreadable.",
        style("\u{2192}").dim()
    );

    Ok(())
}
