//! AES-256-GCM authenticated encryption of single credential values.
//!
//! Each call to `encrypt` generates a fresh random 16-byte nonce from the
//! OS CSPRNG and hands (nonce, tag, ciphertext) to the format codec, which
//! produces the one text value that gets stored:
//!
//! ```text
//! hex(nonce: 16 bytes) ++ hex(tag: 16 bytes) ++ hex(ciphertext)
//! ```
//!
//! `decrypt` reverses this and verifies the tag before returning anything.

use std::sync::Arc;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use rand::rngs::OsRng;
use rand::TryRngCore;
use zeroize::{Zeroize, Zeroizing};

use super::master_key::MasterKey;
use crate::errors::{CredVaultError, DecryptionError, Result};
use crate::vault::format::{self, EncodedSecret, NONCE_LEN};

/// AES-256-GCM with a 128-bit nonce and a 128-bit tag.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Stateless encrypt/decrypt bound to one master key.
///
/// Cheap to clone; clones share the key.
#[derive(Clone, Debug)]
pub struct Cipher {
    key: Arc<MasterKey>,
}

impl Cipher {
    /// Create a cipher that owns `key`.
    pub fn new(key: MasterKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Create a cipher sharing a key held elsewhere.
    pub fn from_shared(key: Arc<MasterKey>) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` into its storable form.
    ///
    /// Blank input (empty after trimming) yields an empty `EncodedSecret`
    /// without touching the cipher: empty means "not set".
    pub fn encrypt(&self, plaintext: &str) -> Result<EncodedSecret> {
        if plaintext.trim().is_empty() {
            return Ok(EncodedSecret::empty());
        }

        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| CredVaultError::Encryption(format!("entropy source failure: {e}")))?;

        self.seal_with_nonce(plaintext, &nonce)
    }

    /// Decrypt a stored value back to plaintext.
    ///
    /// An empty input returns an empty string.  A tag mismatch is
    /// `DecryptionError::Integrity`; anything structurally wrong is
    /// `DecryptionError::Malformed`.
    pub fn decrypt(&self, encoded: &str) -> Result<Zeroizing<String>> {
        if encoded.trim().is_empty() {
            return Ok(Zeroizing::new(String::new()));
        }

        let parts = format::unpack(encoded)?;

        let cipher = self.aead()?;
        let mut buffer = parts.ciphertext;
        let verified = cipher.decrypt_in_place_detached(
            Nonce::<U16>::from_slice(&parts.nonce),
            b"",
            &mut buffer,
            Tag::from_slice(&parts.tag),
        );

        if verified.is_err() {
            // The buffer may hold unverified keystream output; wipe it.
            buffer.zeroize();
            return Err(DecryptionError::Integrity.into());
        }

        // `from_utf8` takes ownership, so no extra plaintext copy is made.
        String::from_utf8(buffer)
            .map(Zeroizing::new)
            .map_err(|e| {
                let mut bad_bytes = e.into_bytes();
                bad_bytes.zeroize();
                DecryptionError::Malformed("decrypted value is not valid UTF-8".into()).into()
            })
    }

    /// Encrypt with a caller-chosen nonce.
    ///
    /// Only `encrypt` and tests call this; nonces must never repeat under
    /// one key.
    pub(crate) fn seal_with_nonce(
        &self,
        plaintext: &str,
        nonce: &[u8; NONCE_LEN],
    ) -> Result<EncodedSecret> {
        let cipher = self.aead()?;

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(nonce), b"", &mut buffer)
            .map_err(|e| CredVaultError::Encryption(format!("AES-256-GCM error: {e}")))?;

        Ok(format::pack(nonce, tag.as_slice(), &buffer))
    }

    fn aead(&self) -> Result<Aes256Gcm16> {
        Aes256Gcm16::new_from_slice(self.key.as_bytes())
            .map_err(|e| CredVaultError::Encryption(format!("invalid key length: {e}")))
    }
}
