//! Integration tests for the CredVault crypto and format modules.

use credvault::crypto::{generate_master_key_hex, Cipher, KeyProvider, MasterKey};
use credvault::errors::{CredVaultError, DecryptionError};
use credvault::vault::{looks_encoded, CredentialVault, SqliteStore};

fn cipher(byte: u8) -> Cipher {
    Cipher::new(MasterKey::new([byte; 32]))
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let c = cipher(0xAB);
    let long = "a".repeat(4096);
    for plaintext in ["sk-test-123", "x", "  padded value  ", "ключ-🔑", long.as_str()] {
        let encoded = c.encrypt(plaintext).expect("encrypt");
        let decoded = c.decrypt(encoded.as_str()).expect("decrypt");
        assert_eq!(decoded.as_str(), plaintext);
    }
}

#[test]
fn encoded_length_is_prefix_plus_two_per_byte() {
    let c = cipher(0x01);
    let encoded = c.encrypt("sk-test-123").unwrap();
    assert_eq!(encoded.len(), 64 + 2 * "sk-test-123".len());
    assert!(looks_encoded(encoded.as_str()));
}

#[test]
fn blank_values_pass_through_as_empty() {
    let c = cipher(0x02);
    assert!(c.encrypt("").unwrap().is_empty());
    assert!(c.encrypt("   \n\t").unwrap().is_empty());
    assert_eq!(c.decrypt("").unwrap().as_str(), "");
    assert_eq!(c.decrypt("   ").unwrap().as_str(), "");
}

#[test]
fn same_plaintext_encrypts_differently_each_time() {
    let c = cipher(0x03);
    let a = c.encrypt("sk-same").unwrap();
    let b = c.encrypt("sk-same").unwrap();
    assert_ne!(a, b);
    // Nonces differ, not just ciphertexts.
    assert_ne!(&a.as_str()[..32], &b.as_str()[..32]);
}

// ---------------------------------------------------------------------------
// Sharing across threads
// ---------------------------------------------------------------------------

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_types_are_send_and_sync() {
    assert_send_sync::<Cipher>();
    assert_send_sync::<KeyProvider>();
    assert_send_sync::<CredentialVault<SqliteStore>>();
}

#[test]
fn one_cipher_serves_many_threads() {
    let c = cipher(0x09);

    let encoded: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let c = &c;
                scope.spawn(move || {
                    let plaintext = format!("sk-thread-{i}");
                    let encoded = c.encrypt(&plaintext).unwrap();
                    assert_eq!(c.decrypt(encoded.as_str()).unwrap().as_str(), plaintext);
                    encoded
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Values sealed on one thread open on another.
    for (i, value) in encoded.iter().enumerate() {
        assert_eq!(
            c.decrypt(value.as_str()).unwrap().as_str(),
            format!("sk-thread-{i}")
        );
    }
}

// ---------------------------------------------------------------------------
// Tamper and key mismatch
// ---------------------------------------------------------------------------

#[test]
fn every_single_character_change_is_detected() {
    let c = cipher(0x04);
    let encoded = c.encrypt("sk-tamper-check").unwrap();
    let original = encoded.as_str();

    for i in 0..original.len() {
        let mut chars: Vec<char> = original.chars().collect();
        chars[i] = if chars[i] == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();

        match c.decrypt(&tampered) {
            Err(CredVaultError::Decryption(DecryptionError::Integrity)) => {}
            other => panic!("position {i}: expected integrity failure, got {other:?}"),
        }
    }
}

#[test]
fn wrong_key_is_an_integrity_failure() {
    let encoded = cipher(0x05).encrypt("sk-other-key").unwrap();
    let err = cipher(0x06).decrypt(encoded.as_str()).unwrap_err();
    assert!(err.is_decryption_failure());
    assert_eq!(err.kind(), "integrity");
}

#[test]
fn truncated_value_is_malformed() {
    let c = cipher(0x07);
    let encoded = c.encrypt("sk-truncate").unwrap();
    let short = &encoded.as_str()[..40];
    assert!(matches!(
        c.decrypt(short),
        Err(CredVaultError::Decryption(DecryptionError::Malformed(_)))
    ));
}

#[test]
fn non_hex_value_is_malformed() {
    let c = cipher(0x08);
    let bogus = "z".repeat(80);
    let err = c.decrypt(&bogus).unwrap_err();
    assert!(err.is_decryption_failure());
    assert_eq!(err.kind(), "decryption");
}

// ---------------------------------------------------------------------------
// Legacy classifier
// ---------------------------------------------------------------------------

#[test]
fn looks_encoded_rejects_plaintext_keys() {
    assert!(!looks_encoded(""));
    assert!(!looks_encoded("sk-proj-abcdef0123456789"));
    assert!(!looks_encoded(&"a".repeat(64)));
    assert!(!looks_encoded(&"A".repeat(66)));
    assert!(!looks_encoded(&"a".repeat(65)));
    assert!(looks_encoded(&"a".repeat(66)));
}

// ---------------------------------------------------------------------------
// Master key
// ---------------------------------------------------------------------------

#[test]
fn key_of_wrong_length_is_a_configuration_error() {
    let short = "a".repeat(63);
    assert!(matches!(
        KeyProvider::from_hex(&short),
        Err(CredVaultError::Configuration(_))
    ));
    let long = "a".repeat(65);
    assert!(matches!(
        KeyProvider::from_hex(&long),
        Err(CredVaultError::Configuration(_))
    ));
}

#[test]
fn key_error_does_not_echo_the_key() {
    let bad = format!("{}zz", "c".repeat(62));
    let err = MasterKey::from_hex(&bad).unwrap_err();
    assert!(!err.to_string().contains(&bad));
}

#[test]
fn generated_key_is_usable() {
    let hex_key = generate_master_key_hex().unwrap();
    assert_eq!(hex_key.len(), 64);

    let provider = KeyProvider::from_hex(&hex_key).unwrap();
    let c = provider.cipher();
    let encoded = c.encrypt("sk-fresh").unwrap();
    assert_eq!(c.decrypt(encoded.as_str()).unwrap().as_str(), "sk-fresh");
}

#[test]
fn same_hex_key_decrypts_across_providers() {
    let hex_key = "0f".repeat(32);
    let encoded = KeyProvider::from_hex(&hex_key)
        .unwrap()
        .cipher()
        .encrypt("sk-restart")
        .unwrap();

    let reloaded = KeyProvider::from_hex(&hex_key).unwrap();
    assert_eq!(
        reloaded.cipher().decrypt(encoded.as_str()).unwrap().as_str(),
        "sk-restart"
    );
}
