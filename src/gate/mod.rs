//! Validation gate — are all required credentials present?
//!
//! The gate only looks at already-decrypted values; it never decrypts,
//! fetches or logs.  Missing credentials are an expected, user-fixable
//! condition, so the gate returns a `ValidationResult` instead of an
//! error.  Callers that must abort turn it into one with `into_result`.

use serde::Serialize;

use crate::errors::{CredVaultError, Result};
use crate::vault::CredentialSet;

/// Outcome of a required-credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// True iff `missing` is empty.
    pub valid: bool,
    /// Required names that were absent or blank, in the order requested.
    pub missing: Vec<String>,
    /// Display-ready text naming what is missing; empty when valid.
    pub message: String,
}

impl ValidationResult {
    /// Convert a failed check into `CredVaultError::MissingCredentials`.
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(CredVaultError::MissingCredentials {
                missing: self.missing,
                message: self.message,
            })
        }
    }
}

/// Check that every name in `required` has a non-blank value in `credentials`.
///
/// Duplicate names in `required` are reported once.
pub fn check_required_credentials<I, N>(credentials: &CredentialSet, required: I) -> ValidationResult
where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut missing: Vec<String> = Vec::new();
    for name in required {
        let name = name.as_ref();
        if !credentials.is_present(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }

    let message = missing_message(&missing);
    ValidationResult {
        valid: missing.is_empty(),
        missing,
        message,
    }
}

/// Human-readable label for a credential name.
pub fn credential_label(name: &str) -> String {
    match name {
        "openai" => "OpenAI API key".to_string(),
        "anthropic" => "Anthropic API key".to_string(),
        "transcription" => "transcription API key".to_string(),
        "assemblyai" => "AssemblyAI API key".to_string(),
        "deepgram" => "Deepgram API key".to_string(),
        other => format!("{other} key"),
    }
}

/// Build the stable message for a list of missing names.
///
/// `Missing required credentials: a, b. Add your <label a> and <label b> in settings.`
fn missing_message(missing: &[String]) -> String {
    if missing.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = missing.iter().map(|n| credential_label(n)).collect();
    format!(
        "Missing required credentials: {}. Add your {} in settings.",
        missing.join(", "),
        join_with_and(&labels)
    )
}

fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {last}", rest.join(", ")),
    }
}
