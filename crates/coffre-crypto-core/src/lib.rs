//! `coffre-crypto-core` — Pure cryptographic data model for COFFRE.
//!
//! This crate is the audit target: zero network, zero async, zero I/O.
//! Cipher math is delegated to the RustCrypto crates; this crate owns the
//! configuration types, the nonce-regeneration discipline, and the
//! checksum format shared by every record type.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod checksum;
pub mod error;

pub mod kdf;
pub mod symmetric;

pub use checksum::{compute_checksum, CHECKSUM_HEX_LEN};
pub use error::CryptoError;
pub use kdf::{
    KdfAlgorithm, KeyDerivationFunctionEntry, PseudorandomFunction, MIN_ITERATIONS, MIN_SALT_LEN,
    SUGGESTED_MIN_ITERATIONS,
};
pub use symmetric::{
    AesCtrSettings, ChaCha20Settings, CipherSettings, SymmetricAlgorithm, SymmetricKeyAlgorithm,
    AES_CTR_COUNTER_LEN, CHACHA20_NONCE_LEN, GENERATED_KEY_SIZE_BITS,
};
