//! Cryptographic error types for `coffre-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed (salt/iteration validation, bad parameters).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Symmetric encryption/decryption failure (AES-CTR, ChaCha20).
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Invalid key material (wrong length, mismatched key size).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Key size not allowed for the selected algorithm.
    #[error("unsupported key size: {0} bits for {1}")]
    UnsupportedKeySize(u32, &'static str),
}
