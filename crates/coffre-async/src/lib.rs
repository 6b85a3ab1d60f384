//! `coffre-async` — Suspend-capable wrappers over the blocking COFFRE API.
//!
//! The core crates are synchronous by design; this crate offloads their
//! calls onto the tokio blocking pool so that a cryptographic operation
//! (a PBKDF2 derivation with 100k+ iterations, a full seal/open cycle)
//! becomes a suspension point instead of blocking the async runtime.
//!
//! Semantics are identical to the blocking forms — same results, same
//! errors, no cancellation mid-operation. [`unblock`] is the universal
//! form: any blocking COFFRE call can be suspended through it. Named
//! wrappers cover the expensive entry points.
//!
//! ```no_run
//! # async fn demo() -> Result<(), coffre_async::TaskError> {
//! use coffre_crypto_core::{KeyDerivationFunctionEntry, SymmetricAlgorithm, SymmetricKeyAlgorithm};
//! use coffre_records::Note;
//!
//! let entry = KeyDerivationFunctionEntry::create_hmac_sha256("primary")?;
//! let key = coffre_async::derive_key_bytes(&entry, b"master password").await?;
//!
//! let note = Note::new("Some topic", "Some text");
//! let algorithm = SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::AesCtr);
//! let secret = coffre_async::seal_note(&note, entry.key_identifier(), algorithm, &key).await?;
//! assert_eq!(coffre_async::open_note(&secret, &key).await?.note_text(), "Some text");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

use coffre_crypto_core::{CryptoError, KeyDerivationFunctionEntry, SymmetricKeyAlgorithm};
use coffre_records::{
    FileEntry, FileEntrySecret, History, HistorySecret, LoginInformation,
    LoginInformationSecret, Note, NoteSecret, PaymentCard, PaymentCardSecret, SecretError,
};
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors produced by suspend-capable operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The blocking-pool task did not complete (it panicked). Callers
    /// awaiting a result otherwise always get the underlying outcome.
    #[error("blocking task did not complete: {0}")]
    Join(String),

    /// Cryptographic failure, identical to the blocking form.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Sealed-record failure, identical to the blocking form.
    #[error(transparent)]
    Secret(#[from] SecretError),
}

/// Run any blocking COFFRE operation on the tokio blocking pool.
///
/// This is the universal suspend-capable form: wrap the blocking call in
/// a closure over owned data and await the result.
///
/// # Errors
///
/// Returns [`TaskError::Join`] only if the closure panics.
pub async fn unblock<T, F>(op: F) -> Result<T, TaskError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| TaskError::Join(e.to_string()))
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Suspend-capable [`KeyDerivationFunctionEntry::derive_key_bytes`] —
/// the main reason this crate exists, since PBKDF2 at 100k+ iterations
/// stalls an async worker for a noticeable fraction of a second.
///
/// # Errors
///
/// Returns [`TaskError::Join`] only if the blocking task panics.
pub async fn derive_key_bytes(
    entry: &KeyDerivationFunctionEntry,
    password: &[u8],
) -> Result<Zeroizing<Vec<u8>>, TaskError> {
    let entry = entry.clone();
    let password = Zeroizing::new(password.to_vec());
    unblock(move || entry.derive_key_bytes(&password)).await
}

// ---------------------------------------------------------------------------
// Symmetric transform
// ---------------------------------------------------------------------------

/// Suspend-capable [`SymmetricKeyAlgorithm::encrypt_bytes`].
///
/// # Errors
///
/// Same failures as the blocking form, plus [`TaskError::Join`] on panic.
pub async fn encrypt_bytes(
    algorithm: &SymmetricKeyAlgorithm,
    data: &[u8],
    derived_key: &[u8],
) -> Result<Vec<u8>, TaskError> {
    let algorithm = algorithm.clone();
    let data = data.to_vec();
    let key = Zeroizing::new(derived_key.to_vec());
    Ok(unblock(move || algorithm.encrypt_bytes(&data, &key)).await??)
}

/// Suspend-capable [`SymmetricKeyAlgorithm::decrypt_bytes`].
///
/// # Errors
///
/// Same failures as the blocking form, plus [`TaskError::Join`] on panic.
pub async fn decrypt_bytes(
    algorithm: &SymmetricKeyAlgorithm,
    data: &[u8],
    derived_key: &[u8],
) -> Result<Vec<u8>, TaskError> {
    let algorithm = algorithm.clone();
    let data = data.to_vec();
    let key = Zeroizing::new(derived_key.to_vec());
    Ok(unblock(move || algorithm.decrypt_bytes(&data, &key)).await??)
}

// ---------------------------------------------------------------------------
// Sealed records — seal / open / probe per record type
// ---------------------------------------------------------------------------

macro_rules! sealed_record_ops {
    (
        $plain:ident, $secret:ident,
        $seal:ident, $open:ident, $probe:ident,
        $to_plain:ident
    ) => {
        /// Suspend-capable seal: encrypt a plaintext record.
        ///
        /// # Errors
        ///
        /// Same failures as the blocking constructor, plus
        /// [`TaskError::Join`] on panic.
        pub async fn $seal(
            record: &$plain,
            key_identifier: &str,
            algorithm: SymmetricKeyAlgorithm,
            derived_key: &[u8],
        ) -> Result<$secret, TaskError> {
            let record = record.clone();
            let key_identifier = key_identifier.to_owned();
            let key = Zeroizing::new(derived_key.to_vec());
            Ok(unblock(move || $secret::new(&record, &key_identifier, algorithm, &key)).await??)
        }

        /// Suspend-capable full decrypt back to the plaintext record.
        ///
        /// # Errors
        ///
        /// Same failures as the blocking form, plus [`TaskError::Join`]
        /// on panic.
        pub async fn $open(secret: &$secret, derived_key: &[u8]) -> Result<$plain, TaskError> {
            let secret = secret.clone();
            let key = Zeroizing::new(derived_key.to_vec());
            Ok(unblock(move || secret.$to_plain(&key)).await??)
        }

        /// Suspend-capable password probe. Never errors — a panicking
        /// blocking task reads as `false`, matching the fail-closed
        /// contract of the blocking probe.
        pub async fn $probe(secret: &$secret, derived_key: &[u8]) -> bool {
            let secret = secret.clone();
            let key = Zeroizing::new(derived_key.to_vec());
            unblock(move || secret.can_be_decrypted_with(&key))
                .await
                .unwrap_or(false)
        }
    };
}

sealed_record_ops!(Note, NoteSecret, seal_note, open_note, probe_note, to_note);
sealed_record_ops!(
    FileEntry,
    FileEntrySecret,
    seal_file_entry,
    open_file_entry,
    probe_file_entry,
    to_file_entry
);
sealed_record_ops!(
    LoginInformation,
    LoginInformationSecret,
    seal_login_information,
    open_login_information,
    probe_login_information,
    to_login_information
);
sealed_record_ops!(
    PaymentCard,
    PaymentCardSecret,
    seal_payment_card,
    open_payment_card,
    probe_payment_card,
    to_payment_card
);
sealed_record_ops!(
    History,
    HistorySecret,
    seal_history,
    open_history,
    probe_history,
    to_history
);

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use coffre_crypto_core::kdf::MIN_ITERATIONS;
    use coffre_crypto_core::{PseudorandomFunction, SymmetricAlgorithm};

    fn test_entry() -> KeyDerivationFunctionEntry {
        KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            b"0123456789abcdef".to_vec(),
            MIN_ITERATIONS,
            32,
            "async-key",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn async_derivation_matches_blocking_derivation() {
        let entry = test_entry();
        let blocking = entry.derive_key_bytes(b"password");
        let suspended = derive_key_bytes(&entry, b"password").await.unwrap();
        assert_eq!(blocking.as_slice(), suspended.as_slice());
    }

    #[tokio::test]
    async fn seal_open_roundtrip_via_blocking_pool() {
        let entry = test_entry();
        let key = derive_key_bytes(&entry, b"password").await.unwrap();
        let note = Note::with_time("Topic", "Body", 1_600_000_000);
        let algorithm = SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::ChaCha20);

        let secret = seal_note(&note, entry.key_identifier(), algorithm, &key)
            .await
            .unwrap();
        assert_eq!(secret.key_identifier(), "async-key");
        assert_eq!(open_note(&secret, &key).await.unwrap(), note);
    }

    #[tokio::test]
    async fn probe_is_fail_closed() {
        let entry = test_entry();
        let key = derive_key_bytes(&entry, b"password").await.unwrap();
        let note = Note::new("Topic", "Body");
        let algorithm = SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::AesCtr);
        let secret = seal_note(&note, "async-key", algorithm, &key).await.unwrap();

        assert!(probe_note(&secret, &key).await);
        let wrong = derive_key_bytes(&entry, b"not the password").await.unwrap();
        assert!(!probe_note(&secret, &wrong).await);
        assert!(!probe_note(&secret, &[]).await);
    }

    #[tokio::test]
    async fn symmetric_transform_roundtrips() {
        let algorithm = SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::AesCtr);
        let key = [0x42u8; 32];
        let ciphertext = encrypt_bytes(&algorithm, b"payload", &key).await.unwrap();
        let plaintext = decrypt_bytes(&algorithm, &ciphertext, &key).await.unwrap();
        assert_eq!(plaintext, b"payload".to_vec());
    }

    #[tokio::test]
    async fn file_entry_roundtrip() {
        let key = [0x17u8; 32];
        let entry = FileEntry::with_time("nice.pdf", &[1, 2, 3], 1_600_000_000);
        let algorithm = SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::AesCtr);
        let secret = seal_file_entry(&entry, "k", algorithm, &key).await.unwrap();
        assert_eq!(open_file_entry(&secret, &key).await.unwrap(), entry);
        assert!(probe_file_entry(&secret, &key).await);
    }
}
