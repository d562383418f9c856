//! High-level credential operations used by jobs, migration and the CLI.
//!
//! `CredentialVault` wraps the cipher and a storage collaborator so the
//! rest of the application can work with simple method calls like
//! `vault.set_credential("user-1", "openai", "sk-...")`.

use tracing::warn;
use zeroize::Zeroizing;

use crate::crypto::Cipher;
use crate::errors::{CredVaultError, Result};

use super::credential::{validate_name, CredentialMetadata, CredentialSet};
use super::format::EncodedSecret;
use super::store::CredentialStore;

/// Outcome of checking one stored record during `verify_all`.
#[derive(Debug)]
pub struct VerifyOutcome {
    pub user_id: String,
    pub name: String,
    /// `None` when the record decrypted cleanly (or is empty).
    pub error: Option<CredVaultError>,
}

/// Credential vault bound to one key and one store.
pub struct CredentialVault<S> {
    cipher: Cipher,
    store: S,
}

impl<S: CredentialStore> CredentialVault<S> {
    pub fn new(cipher: Cipher, store: S) -> Self {
        Self { cipher, store }
    }

    // ------------------------------------------------------------------
    // Credential operations
    // ------------------------------------------------------------------

    /// Encrypt and store a credential.  Returns `true` if it replaced an
    /// existing value.
    ///
    /// A blank plaintext stores an empty value, which reads back as "not set".
    pub fn set_credential(&self, user_id: &str, name: &str, plaintext: &str) -> Result<bool> {
        validate_name("user id", user_id)?;
        validate_name("credential name", name)?;

        let encoded = self.cipher.encrypt(plaintext)?;
        self.store.put(user_id, name, encoded.as_str())
    }

    /// Decrypt one stored credential.
    ///
    /// `Ok(None)` if nothing was ever stored under that name.  A record
    /// that exists but cannot be decrypted is an error, never `None`.
    pub fn get_credential(&self, user_id: &str, name: &str) -> Result<Option<Zeroizing<String>>> {
        validate_name("user id", user_id)?;
        validate_name("credential name", name)?;

        let Some(record) = self.store.get(user_id, name)? else {
            return Ok(None);
        };

        match self.cipher.decrypt(&record.value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    user_id,
                    credential = name,
                    kind = e.kind(),
                    "failed to decrypt stored credential"
                );
                Err(e)
            }
        }
    }

    /// Like `get_credential`, but a missing record is `CredentialNotFound`.
    pub fn require_credential(&self, user_id: &str, name: &str) -> Result<Zeroizing<String>> {
        self.get_credential(user_id, name)?
            .ok_or_else(|| CredVaultError::CredentialNotFound {
                user_id: user_id.to_string(),
                name: name.to_string(),
            })
    }

    /// Remove a credential.
    pub fn delete_credential(&self, user_id: &str, name: &str) -> Result<()> {
        validate_name("user id", user_id)?;
        validate_name("credential name", name)?;

        if !self.store.delete(user_id, name)? {
            return Err(CredVaultError::CredentialNotFound {
                user_id: user_id.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// List metadata for a user's credentials, sorted by name.
    pub fn list_credentials(&self, user_id: &str) -> Result<Vec<CredentialMetadata>> {
        validate_name("user id", user_id)?;
        self.store.list(user_id)
    }

    /// Decrypt the named credentials of one user into a `CredentialSet`.
    ///
    /// Names with no stored record are simply absent from the set (the
    /// validation gate reports them).  The first record that fails to
    /// decrypt aborts the whole load with its error.
    pub fn load_credential_set<I, N>(&self, user_id: &str, names: I) -> Result<CredentialSet>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut set = CredentialSet::new();
        for name in names {
            let name = name.as_ref();
            if let Some(value) = self.get_credential(user_id, name)? {
                set.insert(name, value.as_str());
            }
        }
        Ok(set)
    }

    /// Try to decrypt every stored record and report the ones that fail.
    ///
    /// Used by operators to find corrupted rows or rows written under a
    /// different key.  Values are discarded immediately.
    pub fn verify_all(&self) -> Result<Vec<VerifyOutcome>> {
        let records = self.store.all_records()?;
        let outcomes = records
            .into_iter()
            .map(|record| {
                let error = self.cipher.decrypt(&record.value).err();
                if let Some(ref e) = error {
                    warn!(
                        user_id = %record.user_id,
                        credential = %record.name,
                        kind = e.kind(),
                        "stored credential failed verification"
                    );
                }
                VerifyOutcome {
                    user_id: record.user_id,
                    name: record.name,
                    error,
                }
            })
            .collect();
        Ok(outcomes)
    }

    /// Store an already-encoded value verbatim (migration, restores).
    pub(crate) fn put_encoded(&self, user_id: &str, name: &str, encoded: &EncodedSecret) -> Result<bool> {
        self.store.put(user_id, name, encoded.as_str())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
