//! Error types for `coffre-records`.

use coffre_crypto_core::CryptoError;
use thiserror::Error;

/// Errors produced by sealed-record operations.
///
/// Corruption and wrong-key failures are indistinguishable by design for
/// stream ciphers: a wrong key decrypts to garbage, which then fails
/// envelope validation as [`SecretError::MalformedEnvelope`].
#[derive(Debug, Error)]
pub enum SecretError {
    /// Cryptographic operation failed (delegated from crypto-core).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A getter or setter was called with an empty derived key.
    #[error("derived key must not be empty")]
    EmptyDerivedKey,

    /// The decrypted bytes do not parse as a typed-map envelope —
    /// wrong key, tampered ciphertext, or corrupted storage.
    #[error("decrypted payload is not a well-formed envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope serialization failed (codec boundary).
    #[error("envelope serialization failed: {0}")]
    EnvelopeSerialization(String),

    /// The envelope decrypted cleanly but the requested field is absent.
    #[error("envelope field not found: {0}")]
    FieldNotFound(String),

    /// The requested field exists but carries a different value kind.
    #[error("envelope field {field} is not a {expected}")]
    FieldKindMismatch {
        /// Name of the offending field.
        field: String,
        /// The kind the caller asked for.
        expected: &'static str,
    },
}
