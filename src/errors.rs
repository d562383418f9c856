use thiserror::Error;

/// Generic text shown to users when a stored credential cannot be read.
///
/// The concrete failure kind is logged for operators instead.
pub const STORED_CREDENTIAL_FAILURE: &str =
    "Unable to process stored credential. Please re-enter it in settings.";

/// Generic text shown to users when the master key is not usable.
pub const ENCRYPTION_NOT_CONFIGURED: &str =
    "Credential encryption is not configured. Contact an administrator.";

/// Why an encoded secret could not be turned back into plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptionError {
    /// The authentication tag did not verify: tampering, corruption,
    /// truncation or a different master key.
    #[error("integrity check failed — stored value was altered or encrypted under another key")]
    Integrity,

    /// The encoded value is structurally invalid (length, characters, UTF-8).
    #[error("malformed encoded secret: {0}")]
    Malformed(String),
}

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Key / crypto errors ---
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    // --- Credential errors ---
    #[error("{message}")]
    MissingCredentials {
        missing: Vec<String>,
        message: String,
    },

    #[error("Credential '{name}' not found for user '{user_id}'")]
    CredentialNotFound { user_id: String, name: String },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Audit error: {0}")]
    Audit(String),
}

impl CredVaultError {
    /// Stable label for the error kind, safe to put in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Encryption(_) => "encryption",
            Self::Decryption(DecryptionError::Integrity) => "integrity",
            Self::Decryption(DecryptionError::Malformed(_)) => "decryption",
            Self::MissingCredentials { .. } => "missing_credentials",
            Self::CredentialNotFound { .. } => "not_found",
            Self::InvalidName(_) => "invalid_name",
            Self::Storage(_) => "storage",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::CommandFailed(_) => "command",
            Self::UserCancelled => "cancelled",
            Self::Audit(_) => "audit",
        }
    }

    /// True for every failure to read back a stored value, integrity included.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }

    /// The message to show an end user.
    ///
    /// Decryption and configuration failures collapse to generic texts so
    /// nothing about the stored value or the key leaks into the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::Decryption(_) => STORED_CREDENTIAL_FAILURE.to_string(),
            Self::Configuration(_) => ENCRYPTION_NOT_CONFIGURED.to_string(),
            Self::MissingCredentials { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
