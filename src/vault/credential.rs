//! Credential records as stored, their metadata, and decrypted sets.
//!
//! `StoredCredential` is what the storage collaborator persists: the
//! encoded value plus ownership and timestamps.  `CredentialSet` is the
//! short-lived decrypted view handed to the validation gate and to jobs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::errors::{CredVaultError, Result};

/// Longest accepted user id or credential name.
const MAX_NAME_LEN: usize = 128;

/// A single credential row as held by a store.
///
/// `value` is an encoded secret, or legacy plaintext for rows written
/// before migration.  It is never printed by `Debug`.
#[derive(Clone)]
pub struct StoredCredential {
    pub user_id: String,
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("value_len", &self.value.len())
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Lightweight metadata about a credential (no value).
///
/// Returned by `CredentialVault::list_credentials` so callers can show
/// which credentials exist without touching any ciphertext.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialMetadata {
    pub name: String,
    /// False when the stored value is empty ("not set").
    pub is_set: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredCredential> for CredentialMetadata {
    fn from(record: &StoredCredential) -> Self {
        Self {
            name: record.name.clone(),
            is_set: !record.value.is_empty(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Decrypted credentials for one user, keyed by credential name.
///
/// Values are wiped from memory when the set is dropped.  Hold a set only
/// for the duration of the operation that needs it.
#[derive(Default)]
pub struct CredentialSet {
    values: BTreeMap<String, Zeroizing<String>>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a decrypted value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(name.into(), Zeroizing::new(value.into()));
    }

    /// The decrypted value for `name`, if present (possibly blank).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.as_str())
    }

    /// True when `name` is present and not blank.
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.trim().is_empty())
    }

    /// Names in the set, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CredentialSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Validate a credential name or user id.
///
/// Allowed: ASCII letters, digits, underscores, hyphens, periods.
/// Must be non-empty and at most 128 characters.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CredVaultError::InvalidName(format!("{kind} cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CredVaultError::InvalidName(format!(
            "{kind} cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(CredVaultError::InvalidName(format!(
            "{kind} '{name}' contains invalid characters — only ASCII letters, digits, underscores, hyphens, and periods are allowed"
        )));
    }
    Ok(())
}
