//! The process-wide master key and the provider that resolves it.
//!
//! The key arrives as a 64-character hexadecimal string (32 bytes) from
//! one environment variable.  It is validated when the provider is
//! constructed, so a bad key fails at startup rather than on first use.
//!
//! Error messages never contain any character of the configured value.

use std::fmt;
use std::sync::{Arc, OnceLock};

use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::cipher::Cipher;
use crate::errors::{CredVaultError, Result};

/// Length of the master key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Length of the hex form of the master key.
pub const KEY_HEX_LEN: usize = KEY_LEN * 2;

/// Environment variable read when settings do not name another one.
pub const DEFAULT_MASTER_KEY_ENV: &str = "CREDVAULT_MASTER_KEY";

/// A 32-byte master key that zeroes its memory when dropped.
///
/// Deliberately neither `Clone` nor `Serialize`; share it through
/// [`KeyProvider`] or [`Cipher`], which hold it behind an `Arc`.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Parse a key from its 64-character hex form.
    ///
    /// Surrounding whitespace is ignored.  Upper and lower case are both
    /// accepted.
    pub fn from_hex(value: &str) -> Result<Self> {
        let value = value.trim();

        if value.is_empty() {
            return Err(CredVaultError::Configuration(
                "master key is empty".into(),
            ));
        }

        if value.len() != KEY_HEX_LEN {
            return Err(CredVaultError::Configuration(format!(
                "master key must be {KEY_HEX_LEN} hexadecimal characters ({KEY_LEN} bytes), got {} characters",
                value.len()
            )));
        }

        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CredVaultError::Configuration(
                "master key is not valid hexadecimal".into(),
            ));
        }

        let mut bytes = [0u8; KEY_LEN];
        // Length and alphabet were checked above; the hex error text could
        // echo a key character, so it is dropped.
        hex::decode_to_slice(value, &mut bytes).map_err(|_| {
            CredVaultError::Configuration("master key is not valid hexadecimal".into())
        })?;

        let key = Self::new(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Short, non-reversible identifier for the key: the first 8 bytes of
    /// its SHA-256 digest in hex.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.bytes);
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// KeyProvider
// ---------------------------------------------------------------------------

/// The process-wide provider and the variable it was read from.
static PROCESS_PROVIDER: OnceLock<(String, KeyProvider)> = OnceLock::new();

/// Resolves and holds the master key for everything that encrypts.
///
/// Construct one at startup and pass it (or the [`Cipher`] it hands out)
/// to whatever needs it.  Binaries that want a single process-wide
/// instance can use [`KeyProvider::init_process`].
#[derive(Clone)]
pub struct KeyProvider {
    key: Arc<MasterKey>,
}

impl KeyProvider {
    /// Wrap an already-built key (tests, embedding applications).
    pub fn new(key: MasterKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Build a provider from the 64-character hex form of the key.
    pub fn from_hex(value: &str) -> Result<Self> {
        MasterKey::from_hex(value).map(Self::new)
    }

    /// Build a provider from the environment variable `var_name`.
    ///
    /// Fails with `Configuration` if the variable is unset, not unicode,
    /// or does not hold a valid key.
    pub fn from_env(var_name: &str) -> Result<Self> {
        let raw = std::env::var(var_name).map_err(|e| match e {
            std::env::VarError::NotPresent => {
                CredVaultError::Configuration(format!("{var_name} is not set"))
            }
            std::env::VarError::NotUnicode(_) => {
                CredVaultError::Configuration(format!("{var_name} is not valid unicode"))
            }
        })?;
        let raw = Zeroizing::new(raw);

        let provider = Self::from_hex(&raw).map_err(|e| match e {
            CredVaultError::Configuration(msg) => {
                CredVaultError::Configuration(format!("{var_name}: {msg}"))
            }
            other => other,
        })?;

        debug!(
            var = var_name,
            fingerprint = %provider.key.fingerprint(),
            "master key loaded"
        );
        Ok(provider)
    }

    /// Initialise the process-wide provider from `var_name`, once.
    ///
    /// The first successful call wins; later calls with the same variable
    /// return that provider without reading the environment again.  A later
    /// call naming a different variable is a `Configuration` error.  Racing
    /// first calls are safe: one value is kept and the others are dropped
    /// (and zeroized).
    pub fn init_process(var_name: &str) -> Result<&'static KeyProvider> {
        let (loaded_from, provider) = match PROCESS_PROVIDER.get() {
            Some(entry) => entry,
            None => {
                let provider = Self::from_env(var_name)?;
                PROCESS_PROVIDER.get_or_init(|| (var_name.to_string(), provider))
            }
        };

        if loaded_from != var_name {
            return Err(CredVaultError::Configuration(format!(
                "master key already loaded from {loaded_from}, not {var_name}"
            )));
        }
        Ok(provider)
    }

    /// The process-wide provider, if [`KeyProvider::init_process`] succeeded.
    pub fn process() -> Option<&'static KeyProvider> {
        PROCESS_PROVIDER.get().map(|(_, provider)| provider)
    }

    /// The master key.
    pub fn master_key(&self) -> &MasterKey {
        &self.key
    }

    /// A cipher bound to this provider's key.
    pub fn cipher(&self) -> Cipher {
        Cipher::from_shared(Arc::clone(&self.key))
    }
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyProvider")
            .field("fingerprint", &self.key.fingerprint())
            .finish()
    }
}

/// Generate a fresh random master key in its 64-character hex form.
pub fn generate_master_key_hex() -> Result<Zeroizing<String>> {
    let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
    OsRng
        .try_fill_bytes(&mut bytes[..])
        .map_err(|e| CredVaultError::Encryption(format!("entropy source failure: {e}")))?;
    Ok(Zeroizing::new(hex::encode(&bytes[..])))
}
