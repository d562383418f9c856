use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::DEFAULT_MASTER_KEY_ENV;
use crate::errors::{CredVaultError, Result};

/// Project-level configuration, loaded from `.credvault.toml`.
///
/// Every field has a sensible default so CredVault works out-of-the-box
/// without any config file at all.  The master key itself is never read
/// from this file, only the name of the variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Environment variable holding the 64-hex-character master key.
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,

    /// Directory (relative to project root) for the database and audit log.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// File name of the credential database inside `data_dir`.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Credentials a job needs before it may start.
    #[serde(default = "default_required_credentials")]
    pub required_credentials: Vec<String>,

    /// Record operations in `<data_dir>/audit.db`.
    #[serde(default = "default_audit_log")]
    pub audit_log: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_master_key_env() -> String {
    DEFAULT_MASTER_KEY_ENV.to_string()
}

fn default_data_dir() -> String {
    ".credvault".to_string()
}

fn default_database_file() -> String {
    "credentials.db".to_string()
}

fn default_required_credentials() -> Vec<String> {
    vec!["openai".to_string(), "transcription".to_string()]
}

fn default_audit_log() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_key_env: default_master_key_env(),
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            required_credentials: default_required_credentials(),
            audit_log: default_audit_log(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".credvault.toml";

    /// Load settings from `<project_dir>/.credvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or holds invalid values,
    /// a `Configuration` error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CredVaultError::Configuration(format!(
                "Failed to parse {}: {e}",
                config_path.display()
            ))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make later steps fail in confusing ways.
    pub fn validate(&self) -> Result<()> {
        if self.master_key_env.trim().is_empty() {
            return Err(CredVaultError::Configuration(
                "master_key_env cannot be empty".into(),
            ));
        }
        if self.database_file.trim().is_empty() {
            return Err(CredVaultError::Configuration(
                "database_file cannot be empty".into(),
            ));
        }
        for name in &self.required_credentials {
            crate::vault::credential::validate_name("required credential", name)
                .map_err(|e| CredVaultError::Configuration(e.to_string()))?;
        }
        Ok(())
    }

    /// Directory holding the database and audit log.
    ///
    /// Example: `project_dir/.credvault`
    pub fn data_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.data_dir)
    }

    /// Full path of the credential database.
    ///
    /// Example: `project_dir/.credvault/credentials.db`
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        self.data_path(project_dir).join(&self.database_file)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
