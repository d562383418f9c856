//! Preflight for jobs that act with a user's credentials.
//!
//! Before a job starts, its required credentials are decrypted and handed
//! to the validation gate.  The job only runs when every one of them is
//! present.  Two distinct ways to be refused:
//!
//! - `MissingCredentials`: the user has not set something; the error
//!   message is the gate's actionable text.
//! - a decryption failure: a stored value is unreadable; the error kind
//!   is preserved and logged, and `user_message()` stays generic.

use tracing::{error, info};

use crate::errors::Result;
use crate::gate::check_required_credentials;
use crate::vault::{CredentialSet, CredentialStore, CredentialVault};

/// Decrypt `required` for `user_id` and check them with the gate.
///
/// Returns the decrypted set on success.  Drop it as soon as the job is
/// done; prefer [`with_job_credentials`] which scopes it for you.
pub fn prepare_job<S, I, N>(
    vault: &CredentialVault<S>,
    user_id: &str,
    required: I,
) -> Result<CredentialSet>
where
    S: CredentialStore,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let required: Vec<String> = required
        .into_iter()
        .map(|n| n.as_ref().to_string())
        .collect();

    let credentials = vault
        .load_credential_set(user_id, &required)
        .map_err(|e| {
            error!(user_id, kind = e.kind(), "job preflight could not read credentials");
            e
        })?;

    let result = check_required_credentials(&credentials, &required);
    if !result.valid {
        info!(
            user_id,
            missing = %result.missing.join(","),
            "job preflight refused: missing credentials"
        );
    }
    result.into_result()?;

    Ok(credentials)
}

/// Run `job` with the user's decrypted credentials, then discard them.
///
/// The job never starts if preflight fails.
pub fn with_job_credentials<S, I, N, T, F>(
    vault: &CredentialVault<S>,
    user_id: &str,
    required: I,
    job: F,
) -> Result<T>
where
    S: CredentialStore,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
    F: FnOnce(&CredentialSet) -> Result<T>,
{
    let credentials = prepare_job(vault, user_id, required)?;
    job(&credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Cipher, MasterKey};
    use crate::errors::{CredVaultError, DecryptionError, STORED_CREDENTIAL_FAILURE};
    use crate::vault::MemoryStore;

    fn vault() -> CredentialVault<MemoryStore> {
        CredentialVault::new(Cipher::new(MasterKey::new([0x5a; 32])), MemoryStore::new())
    }

    #[test]
    fn complete_credentials_pass() {
        let v = vault();
        v.set_credential("u1", "openai", "k1").unwrap();
        v.set_credential("u1", "transcription", "k2").unwrap();

        let set = prepare_job(&v, "u1", ["openai", "transcription"]).unwrap();
        assert_eq!(set.get("openai"), Some("k1"));
        assert_eq!(set.get("transcription"), Some("k2"));
    }

    #[test]
    fn missing_credentials_abort_with_gate_message() {
        let v = vault();
        v.set_credential("u1", "openai", "k1").unwrap();

        let err = prepare_job(&v, "u1", ["openai", "transcription"]).unwrap_err();
        assert_eq!(err.kind(), "missing_credentials");
        assert_eq!(
            err.user_message(),
            "Missing required credentials: transcription. Add your transcription API key in settings."
        );
    }

    #[test]
    fn blank_stored_value_counts_as_missing() {
        let v = vault();
        v.set_credential("u1", "openai", "").unwrap();
        let err = prepare_job(&v, "u1", ["openai"]).unwrap_err();
        assert!(matches!(err, CredVaultError::MissingCredentials { .. }));
    }

    #[test]
    fn unreadable_credential_keeps_its_kind() {
        let v = vault();
        let foreign = Cipher::new(MasterKey::new([0x01; 32]))
            .encrypt("k1")
            .unwrap();
        v.store().put("u1", "openai", foreign.as_str()).unwrap();

        let err = prepare_job(&v, "u1", ["openai"]).unwrap_err();
        assert!(matches!(
            err,
            CredVaultError::Decryption(DecryptionError::Integrity)
        ));
        assert_eq!(err.user_message(), STORED_CREDENTIAL_FAILURE);
    }

    #[test]
    fn job_does_not_run_when_preflight_fails() {
        let v = vault();
        let mut ran = false;
        let result = with_job_credentials(&v, "u1", ["openai"], |_| {
            ran = true;
            Ok(())
        });
        assert!(result.is_err());
        assert!(!ran);
    }

    #[test]
    fn job_sees_credentials() {
        let v = vault();
        v.set_credential("u1", "openai", "k1").unwrap();
        let len = with_job_credentials(&v, "u1", ["openai"], |creds| {
            Ok(creds.get("openai").map(str::len).unwrap_or(0))
        })
        .unwrap();
        assert_eq!(len, 2);
    }
}
