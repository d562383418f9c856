//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - The master key and its process-wide provider (`master_key`)
//! - AES-256-GCM encryption and decryption of single values (`cipher`)

pub mod cipher;
pub mod master_key;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{Cipher, KeyProvider, MasterKey};
pub use cipher::Cipher;
pub use master_key::{generate_master_key_hex, KeyProvider, MasterKey, DEFAULT_MASTER_KEY_ENV};
