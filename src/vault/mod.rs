//! Vault module — encoded credential storage.
//!
//! This module provides:
//! - The encoded-secret text format and legacy classifier (`format`)
//! - `StoredCredential`, `CredentialMetadata` and `CredentialSet` (`credential`)
//! - Storage collaborators: `SqliteStore`, `MemoryStore` (`store`)
//! - High-level `CredentialVault` tying cipher and store together (`manager`)

pub mod credential;
pub mod format;
pub mod manager;
pub mod store;

// Re-export the most commonly used items.
pub use credential::{CredentialMetadata, CredentialSet, StoredCredential};
pub use format::{looks_encoded, EncodedSecret};
pub use manager::{CredentialVault, VerifyOutcome};
pub use store::{CredentialStore, MemoryStore, SqliteStore};
