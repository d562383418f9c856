//! Text encoding of encrypted credential values.
//!
//! An encoded secret is one lowercase hex string with no delimiters:
//!
//! ```text
//! [nonce: 32 hex chars][tag: 32 hex chars][ciphertext: 2 hex chars per byte]
//! ```
//!
//! - **Nonce**: 16 random bytes, fresh per encryption.
//! - **Tag**: 16-byte AES-GCM authentication tag.
//! - **Ciphertext**: same length as the UTF-8 plaintext.
//!
//! The first two fields have fixed lengths, so splitting is positional.
//! Only lowercase hex is accepted on the way back in, which keeps the
//! encoding canonical: changing any single character changes the bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DecryptionError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Nonce (IV) size in bytes.
pub const NONCE_LEN: usize = 16;

/// Authentication tag size in bytes.
pub const TAG_LEN: usize = 16;

/// Hex characters taken by nonce + tag.
pub const PREFIX_HEX_LEN: usize = (NONCE_LEN + TAG_LEN) * 2;

// ---------------------------------------------------------------------------
// EncodedSecret
// ---------------------------------------------------------------------------

/// The only form in which a credential is ever persisted.
///
/// An empty `EncodedSecret` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedSecret(String);

impl EncodedSecret {
    /// The empty value ("no secret set").
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap a value exactly as it came back from storage.
    ///
    /// No validation happens here; `Cipher::decrypt` does that.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for EncodedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The three binary parts of an encoded secret.
#[derive(Debug)]
pub struct SecretParts {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Concatenate `hex(nonce) ++ hex(tag) ++ hex(ciphertext)`.
pub fn pack(nonce: &[u8; NONCE_LEN], tag: &[u8], ciphertext: &[u8]) -> EncodedSecret {
    let mut out = String::with_capacity(PREFIX_HEX_LEN + ciphertext.len() * 2);
    out.push_str(&hex::encode(nonce));
    out.push_str(&hex::encode(tag));
    out.push_str(&hex::encode(ciphertext));
    EncodedSecret(out)
}

/// Split an encoded secret back into nonce, tag and ciphertext.
///
/// Fails with `DecryptionError::Malformed` when the value is shorter than
/// the nonce + tag prefix, holds anything other than lowercase hex, or
/// has a ciphertext part of odd length.
pub fn unpack(encoded: &str) -> Result<SecretParts> {
    if encoded.len() < PREFIX_HEX_LEN {
        return Err(DecryptionError::Malformed(format!(
            "encoded value is {} characters, shorter than the {PREFIX_HEX_LEN}-character nonce and tag prefix",
            encoded.len()
        ))
        .into());
    }

    if !is_lower_hex(encoded) {
        return Err(
            DecryptionError::Malformed("encoded value contains non-hex characters".into()).into(),
        );
    }

    // All-ASCII from here on, so byte offsets are char offsets.
    let (prefix, body) = encoded.split_at(PREFIX_HEX_LEN);
    let (nonce_hex, tag_hex) = prefix.split_at(NONCE_LEN * 2);

    if body.len() % 2 != 0 {
        return Err(
            DecryptionError::Malformed("ciphertext has an odd number of hex digits".into()).into(),
        );
    }

    let mut nonce = [0u8; NONCE_LEN];
    let mut tag = [0u8; TAG_LEN];
    hex::decode_to_slice(nonce_hex, &mut nonce)
        .map_err(|e| DecryptionError::Malformed(format!("nonce: {e}")))?;
    hex::decode_to_slice(tag_hex, &mut tag)
        .map_err(|e| DecryptionError::Malformed(format!("tag: {e}")))?;
    let ciphertext =
        hex::decode(body).map_err(|e| DecryptionError::Malformed(format!("ciphertext: {e}")))?;

    Ok(SecretParts {
        nonce,
        tag,
        ciphertext,
    })
}

/// Best-effort guess whether `value` is already an encoded secret.
///
/// **Migration aid only.** It answers "does this look like our format",
/// not "is this safe": a plaintext that happens to be long lowercase hex
/// is misclassified.  Never use it to decide whether to trust a value.
///
/// True when the value is lowercase hex of even length and longer than the
/// nonce + tag prefix (an encoded secret always carries ciphertext).
pub fn looks_encoded(value: &str) -> bool {
    value.len() > PREFIX_HEX_LEN && value.len() % 2 == 0 && is_lower_hex(value)
}

fn is_lower_hex(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
