//! `credvault check-key` — confirm the master key loads and works.

use crate::cli::{output, Context};
use crate::errors::{CredVaultError, Result};

const PROBE: &str = "credvault-key-probe";

/// Execute the `check-key` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let provider = ctx.key_provider()?;

    // A full encrypt/decrypt cycle proves the key is usable, not just parseable.
    let cipher = provider.cipher();
    let encoded = cipher.encrypt(PROBE)?;
    let decoded = cipher.decrypt(encoded.as_str())?;
    if decoded.as_str() != PROBE {
        return Err(CredVaultError::Encryption(
            "self-test round trip returned a different value".into(),
        ));
    }

    output::success(&format!(
        "Master key from {} is valid (fingerprint {}).",
        ctx.settings.master_key_env,
        provider.master_key().fingerprint()
    ));
    Ok(())
}
