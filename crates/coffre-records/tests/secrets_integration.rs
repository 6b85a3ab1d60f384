#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! End-to-end scenarios: derive a key, seal records, persist, reopen.

use coffre_crypto_core::kdf::MIN_ITERATIONS;
use coffre_crypto_core::symmetric::{
    AesCtrSettings, CipherSettings, SymmetricAlgorithm, SymmetricKeyAlgorithm,
};
use coffre_crypto_core::{KeyDerivationFunctionEntry, PseudorandomFunction};
use coffre_records::{
    FileEntry, FileEntrySecret, LoginInformation, LoginInformationFields,
    LoginInformationSecret, Note, NoteSecret,
};

/// The pinned file-secret vector: a 16-byte key, AES-128-CTR with an
/// explicit initial counter, and a small binary payload. Decryption with
/// the exact key must reproduce the payload; any single altered key byte
/// must fail closed.
#[test]
fn file_secret_vector_roundtrip_and_fail_closed() {
    let derived_key: [u8; 16] = *b"0123456789ABCDEF";
    let algorithm = SymmetricKeyAlgorithm::new(
        CipherSettings::AesCtr(AesCtrSettings::new(*b"ABCDEFGHIJKLMNOP")),
        128,
    )
    .unwrap();

    let content: [u8; 12] = [1, 2, 3, 1, 2, 255, 0, 0, 0, 0, 0, 0];
    let entry = FileEntry::new("nice.pdf", &content);
    let secret = FileEntrySecret::new(&entry, "primary", algorithm, &derived_key).unwrap();

    assert_eq!(secret.filename(&derived_key).unwrap(), "nice.pdf");
    assert_eq!(secret.file_content(&derived_key).unwrap(), content.to_vec());

    for position in 0..derived_key.len() {
        let mut altered = derived_key;
        altered[position] ^= 0x01;
        assert!(
            !secret.can_be_decrypted_with(&altered),
            "altered key byte {position} must not decrypt"
        );
    }
}

/// The pinned note scenario: a fresh checksum is 64 lowercase hex chars
/// and survives the persisted form byte-for-byte.
#[test]
fn note_checksum_survives_persistence_exactly() {
    let note = Note::new("Some topic", "Some text");

    let checksum = note.checksum().to_owned();
    assert_eq!(checksum.len(), 64);
    assert!(checksum
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

    let json = serde_json::to_string(&note).unwrap();
    let restored: Note = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.checksum(), checksum);
    assert!(restored.check_if_checksum_matches_content());
}

/// Full pipeline: password → KDF entry → derived key → sealed login →
/// persisted JSON → reopened and downgraded back to plaintext.
#[test]
fn password_to_sealed_login_and_back() {
    let kdf = KeyDerivationFunctionEntry::new(
        PseudorandomFunction::HmacSha256,
        b"integration-salt".to_vec(),
        MIN_ITERATIONS,
        32,
        "vault-main",
    )
    .unwrap();
    let key = kdf.derive_key_bytes(b"master password");

    let login = LoginInformation::with_time(
        &LoginInformationFields {
            title: "Bank",
            url: "https://bank.example.com",
            email: "me@example.com",
            username: "me",
            password: "very long and random",
            ..LoginInformationFields::default()
        },
        1_650_000_000,
    );

    let algorithm = SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::ChaCha20);
    let secret =
        LoginInformationSecret::new(&login, kdf.key_identifier(), algorithm, &key).unwrap();
    assert_eq!(secret.key_identifier(), "vault-main");

    // Persist both the KDF entry and the sealed record, then reload.
    let kdf_json = serde_json::to_string(&kdf).unwrap();
    let secret_json = serde_json::to_string(&secret).unwrap();
    let kdf: KeyDerivationFunctionEntry = serde_json::from_str(&kdf_json).unwrap();
    let secret: LoginInformationSecret = serde_json::from_str(&secret_json).unwrap();
    assert!(kdf.check_if_checksum_matches_content());
    assert!(secret.check_if_checksum_matches_content());

    // Re-derive from the password and open.
    let key = kdf.derive_key_bytes(b"master password");
    assert!(secret.can_be_decrypted_with(&key));
    assert_eq!(secret.to_login_information(&key).unwrap(), login);

    // A wrong password derives a key that fails closed.
    let wrong = kdf.derive_key_bytes(b"master passwort");
    assert!(!secret.can_be_decrypted_with(&wrong));
    assert!(secret.password(&wrong).is_err());
}

/// Every successful setter leaves a record that a fresh reader (through
/// persistence) can still open, and regenerates the configuration.
#[test]
fn setters_keep_persisted_records_openable() {
    let key = [0x2Bu8; 32];
    let note = Note::with_time("Topic", "Original", 1_600_000_000);
    let algorithm = SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::AesCtr);
    let mut secret = NoteSecret::new(&note, "k1", algorithm, &key).unwrap();

    let mut seen_settings = vec![secret.algorithm().settings().clone()];
    for body in ["first edit", "second edit", "third edit"] {
        assert!(secret.set_note_text(body, &key));
        let settings = secret.algorithm().settings().clone();
        assert!(
            !seen_settings.contains(&settings),
            "configuration must be regenerated on every mutation"
        );
        seen_settings.push(settings);

        let json = serde_json::to_string(&secret).unwrap();
        let reloaded: NoteSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.note_text(&key).unwrap(), body);
        assert!(reloaded.check_if_checksum_matches_content());
    }
}
