//! Integration tests for the CredVault vault, gate, preflight and migration.

use credvault::crypto::{Cipher, MasterKey};
use credvault::errors::{CredVaultError, STORED_CREDENTIAL_FAILURE};
use credvault::gate::check_required_credentials;
use credvault::migrate::migrate_legacy_values;
use credvault::preflight::{prepare_job, with_job_credentials};
use credvault::vault::{looks_encoded, CredentialStore, CredentialVault, SqliteStore};
use tempfile::TempDir;

const REQUIRED: [&str; 2] = ["openai", "transcription"];

/// Helper: a vault backed by a fresh SQLite file inside a temp dir.
fn sqlite_vault(dir: &TempDir, key: u8) -> CredentialVault<SqliteStore> {
    let store = SqliteStore::open(&dir.path().join("data").join("credentials.db"))
        .expect("open store");
    CredentialVault::new(Cipher::new(MasterKey::new([key; 32])), store)
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn values_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    {
        let vault = sqlite_vault(&dir, 0x11);
        vault.set_credential("u1", "openai", "sk-test-123").unwrap();
    }

    let vault = sqlite_vault(&dir, 0x11);
    let value = vault.get_credential("u1", "openai").unwrap().unwrap();
    assert_eq!(value.as_str(), "sk-test-123");
}

#[test]
fn database_holds_no_plaintext() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x12);
    vault
        .set_credential("u1", "openai", "sk-very-recognisable-value")
        .unwrap();

    let raw = vault.store().get("u1", "openai").unwrap().unwrap();
    assert!(looks_encoded(&raw.value));
    assert!(!raw.value.contains("sk-very"));

    let bytes = std::fs::read(dir.path().join("data").join("credentials.db")).unwrap();
    let needle = b"sk-very-recognisable-value";
    assert!(!bytes.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn users_are_isolated() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x13);
    vault.set_credential("alice", "openai", "sk-alice").unwrap();

    assert!(vault.get_credential("bob", "openai").unwrap().is_none());
    assert!(vault.list_credentials("bob").unwrap().is_empty());
    assert_eq!(vault.list_credentials("alice").unwrap().len(), 1);
}

#[test]
fn update_keeps_created_at() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x14);

    assert!(!vault.set_credential("u1", "openai", "sk-one").unwrap());
    let first = vault.list_credentials("u1").unwrap()[0].clone();

    assert!(vault.set_credential("u1", "openai", "sk-two").unwrap());
    let second = vault.list_credentials("u1").unwrap()[0].clone();

    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(
        vault.get_credential("u1", "openai").unwrap().unwrap().as_str(),
        "sk-two"
    );
}

#[test]
fn clearing_a_credential_marks_it_not_set() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x15);
    vault.set_credential("u1", "openai", "sk-x").unwrap();
    vault.set_credential("u1", "openai", "   ").unwrap();

    let meta = vault.list_credentials("u1").unwrap();
    assert!(!meta[0].is_set);
    assert_eq!(vault.get_credential("u1", "openai").unwrap().unwrap().as_str(), "");
}

#[test]
fn delete_missing_credential_is_not_found() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x16);
    assert!(matches!(
        vault.delete_credential("u1", "openai"),
        Err(CredVaultError::CredentialNotFound { .. })
    ));
}

// ---------------------------------------------------------------------------
// Job preflight
// ---------------------------------------------------------------------------

#[test]
fn job_runs_when_all_credentials_present() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x21);
    vault.set_credential("u1", "openai", "sk-test-123").unwrap();
    vault.set_credential("u1", "transcription", "tr-456").unwrap();

    let seen = with_job_credentials(&vault, "u1", REQUIRED, |creds| {
        Ok(creds.get("openai").map(str::to_string))
    })
    .unwrap();
    assert_eq!(seen.as_deref(), Some("sk-test-123"));
}

#[test]
fn job_is_refused_when_a_credential_is_missing() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x22);
    vault.set_credential("u1", "openai", "sk-test-123").unwrap();

    let mut ran = false;
    let err = with_job_credentials(&vault, "u1", REQUIRED, |_| {
        ran = true;
        Ok(())
    })
    .unwrap_err();

    assert!(!ran);
    match err {
        CredVaultError::MissingCredentials { missing, message } => {
            assert_eq!(missing, vec!["transcription"]);
            assert!(message.contains("transcription"));
        }
        other => panic!("expected missing credentials, got {other:?}"),
    }
}

#[test]
fn job_is_refused_when_a_credential_was_written_under_another_key() {
    let dir = TempDir::new().unwrap();
    {
        let old = sqlite_vault(&dir, 0x23);
        old.set_credential("u1", "openai", "sk-old").unwrap();
        old.set_credential("u1", "transcription", "tr-old").unwrap();
    }

    let vault = sqlite_vault(&dir, 0x24);
    let err = prepare_job(&vault, "u1", REQUIRED).unwrap_err();
    assert!(err.is_decryption_failure());
    assert_eq!(err.kind(), "integrity");
    assert_eq!(err.user_message(), STORED_CREDENTIAL_FAILURE);
}

#[test]
fn gate_treats_blank_values_as_missing() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x25);
    vault.set_credential("u1", "openai", "").unwrap();
    vault.set_credential("u1", "transcription", "tr-1").unwrap();

    let set = vault.load_credential_set("u1", REQUIRED).unwrap();
    let result = check_required_credentials(&set, REQUIRED);
    assert!(!result.valid);
    assert_eq!(result.missing, vec!["openai"]);
}

// ---------------------------------------------------------------------------
// Migration and verification
// ---------------------------------------------------------------------------

#[test]
fn legacy_rows_are_migrated_in_sqlite() {
    let dir = TempDir::new().unwrap();
    let vault = sqlite_vault(&dir, 0x31);
    vault.store().put("u1", "openai", "sk-legacy-plain").unwrap();
    vault.store().put("u2", "transcription", "tr-legacy").unwrap();
    vault.set_credential("u3", "openai", "sk-modern").unwrap();

    let report = migrate_legacy_values(&vault, false).unwrap();
    assert_eq!(report.migrated.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.is_clean());

    for record in vault.store().all_records().unwrap() {
        assert!(looks_encoded(&record.value), "{} not encoded", record.name);
    }
    assert_eq!(
        vault.get_credential("u2", "transcription").unwrap().unwrap().as_str(),
        "tr-legacy"
    );
}

#[test]
fn verify_all_reports_foreign_key_rows() {
    let dir = TempDir::new().unwrap();
    {
        let old = sqlite_vault(&dir, 0x41);
        old.set_credential("u1", "openai", "sk-old").unwrap();
    }
    let vault = sqlite_vault(&dir, 0x42);
    vault.set_credential("u2", "openai", "sk-new").unwrap();
    vault.set_credential("u2", "transcription", "").unwrap();

    let outcomes = vault.verify_all().unwrap();
    assert_eq!(outcomes.len(), 3);

    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].user_id, "u1");
    assert_eq!(failed[0].error.as_ref().unwrap().kind(), "integrity");
}
