//! CLI module — Clap argument parser, shared context, output helpers,
//! and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::audit::AuditLog;
use crate::config::Settings;
use crate::crypto::KeyProvider;
use crate::errors::Result;
use crate::vault::credential::validate_name;
use crate::vault::{CredentialVault, SqliteStore};

/// CredVault CLI: encrypted per-user API credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Encrypted per-user API credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// User whose credentials to operate on
    #[arg(short, long, env = "CREDVAULT_USER", default_value = "default", global = true)]
    pub user: String,

    /// Data directory (overrides `data_dir` from .credvault.toml)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Diagnostic log level on stderr (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a new random master key
    Keygen,

    /// Check that the configured master key is usable
    CheckKey,

    /// Store a credential (add or update)
    Set {
        /// Credential name (e.g. openai, transcription)
        name: String,
        /// Credential value (omit for interactive prompt)
        value: Option<String>,
    },

    /// Print a credential's decrypted value
    Get {
        /// Credential name
        name: String,
    },

    /// List the user's credentials
    List,

    /// Delete a credential
    Delete {
        /// Credential name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check that the credentials a job needs are present
    Check {
        /// Required credential names (default: `required_credentials` from config)
        #[arg(short, long, value_delimiter = ',')]
        require: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encrypt legacy plaintext values in the store
    Migrate {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Try to decrypt every stored credential and report failures
    Verify,

    /// View the audit log of credential operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared context used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a command needs to know about where it runs.
pub struct Context {
    pub settings: Settings,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub user: String,
}

impl Context {
    /// Resolve settings from the current directory and CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_from(&std::env::current_dir()?, cli)
    }

    fn load_from(project_dir: &Path, cli: &Cli) -> Result<Self> {
        let mut settings = Settings::load(project_dir)?;
        if let Some(ref dir) = cli.data_dir {
            settings.data_dir = dir.clone();
        }

        validate_name("user id", &cli.user)?;

        Ok(Self {
            data_dir: settings.data_path(project_dir),
            database_path: settings.database_path(project_dir),
            settings,
            user: cli.user.clone(),
        })
    }

    /// The process-wide key provider.
    ///
    /// Fails with `Configuration` before anything touches the store.
    pub fn key_provider(&self) -> Result<&'static KeyProvider> {
        KeyProvider::init_process(&self.settings.master_key_env)
    }

    /// Load the master key, then open the credential database.
    pub fn open_vault(&self) -> Result<CredentialVault<SqliteStore>> {
        let provider = self.key_provider()?;
        let store = SqliteStore::open(&self.database_path)?;
        Ok(CredentialVault::new(provider.cipher(), store))
    }

    /// Record an audit entry if auditing is enabled.  Never fails.
    pub fn audit(&self, operation: &str, credential: Option<&str>, details: Option<&str>) {
        if !self.settings.audit_log {
            return;
        }
        if let Some(log) = AuditLog::open(&self.data_dir) {
            log.log(operation, &self.user, credential, details);
        }
    }
}
