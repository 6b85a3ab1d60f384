//! PBKDF2 key-derivation entries.
//!
//! This module provides:
//! - [`KeyDerivationFunctionEntry`] — stored PBKDF2 parameters (PRF, salt,
//!   iterations, output length) plus a key identifier and checksum
//! - [`KeyDerivationFunctionEntry::derive_key_bytes`] — password → key,
//!   a pure function of the password and the stored parameters
//! - [`KeyDerivationFunctionEntry::create_hmac_sha256`] /
//!   [`KeyDerivationFunctionEntry::create_hmac_sha512`] — convenience
//!   constructors with a random salt and jittered iteration count
//!
//! Entries are immutable after creation: changing any parameter means
//! building a new entry (and re-encrypting everything derived from it).

use crate::checksum::compute_checksum;
use crate::error::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

/// Minimum salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

/// Minimum accepted iteration count.
pub const MIN_ITERATIONS: u32 = 4_000;

/// Suggested minimum iteration count for new entries.
pub const SUGGESTED_MIN_ITERATIONS: u32 = 100_000;

/// Minimum derived key length in bytes.
pub const MIN_DERIVED_KEY_LEN: u32 = 16;

/// Derived key length used by the convenience constructors (256 bits).
const DEFAULT_DERIVED_KEY_LEN: u32 = 32;

/// Mask for the random iteration jitter (0..4096) added by the
/// convenience constructors, so that two entries created with identical
/// inputs still differ in their stored parameters.
const ITERATION_JITTER_MASK: u32 = 0x0FFF;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Key-derivation algorithm selector. Only PBKDF2 is supported; the tag
/// is persisted so future algorithms can coexist in stored data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    /// PBKDF2 (RFC 2898).
    #[serde(rename = "PBKDF2")]
    Pbkdf2,
}

/// Pseudorandom function for PBKDF2. SHA-1 based PRFs are deliberately
/// not representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PseudorandomFunction {
    /// HMAC-SHA-256.
    #[serde(rename = "HMAC_SHA256")]
    HmacSha256,
    /// HMAC-SHA-512.
    #[serde(rename = "HMAC_SHA512")]
    HmacSha512,
}

impl PseudorandomFunction {
    /// Stable PRF name used in checksum input.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HmacSha256 => "HMAC_SHA256",
            Self::HmacSha512 => "HMAC_SHA512",
        }
    }
}

/// Stored PBKDF2 parameters for deriving a symmetric key from a password.
///
/// The same entry always derives the same key from the same password —
/// required for decryption to work across sessions. The `key_identifier`
/// links sealed records to the entry that derives their key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationFunctionEntry {
    algorithm: KdfAlgorithm,
    pseudorandom_function: PseudorandomFunction,
    salt: Vec<u8>,
    iterations: u32,
    derived_key_length_in_bytes: u32,
    key_identifier: String,
    checksum: String,
}

impl KeyDerivationFunctionEntry {
    /// Build an entry from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivation`] naming the violated
    /// constraint if the salt is shorter than 16 bytes, the iteration
    /// count is below 4 000, the derived key length is below 16 bytes,
    /// or the key identifier is empty.
    pub fn new(
        pseudorandom_function: PseudorandomFunction,
        salt: Vec<u8>,
        iterations: u32,
        derived_key_length_in_bytes: u32,
        key_identifier: &str,
    ) -> Result<Self, CryptoError> {
        if salt.len() < MIN_SALT_LEN {
            return Err(CryptoError::KeyDerivation(format!(
                "salt too short: {} bytes (minimum {MIN_SALT_LEN})",
                salt.len()
            )));
        }
        if iterations < MIN_ITERATIONS {
            return Err(CryptoError::KeyDerivation(format!(
                "iteration count too low: {iterations} (minimum {MIN_ITERATIONS})"
            )));
        }
        if derived_key_length_in_bytes < MIN_DERIVED_KEY_LEN {
            return Err(CryptoError::KeyDerivation(format!(
                "derived key too short: {derived_key_length_in_bytes} bytes (minimum {MIN_DERIVED_KEY_LEN})"
            )));
        }
        if key_identifier.is_empty() {
            return Err(CryptoError::KeyDerivation(
                "key identifier must not be empty".into(),
            ));
        }

        let mut entry = Self {
            algorithm: KdfAlgorithm::Pbkdf2,
            pseudorandom_function,
            salt,
            iterations,
            derived_key_length_in_bytes,
            key_identifier: key_identifier.to_owned(),
            checksum: String::new(),
        };
        entry.checksum = entry.compute_content_checksum();
        Ok(entry)
    }

    /// New entry with HMAC-SHA-256, a random 16-byte salt, and an
    /// iteration count of 100 000 plus random jitter in `0..4096`.
    ///
    /// The jitter keeps otherwise-identical entries from sharing a
    /// parameter fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivation`] if `key_identifier` is empty.
    pub fn create_hmac_sha256(key_identifier: &str) -> Result<Self, CryptoError> {
        Self::create_with_random_parameters(PseudorandomFunction::HmacSha256, key_identifier)
    }

    /// New entry with HMAC-SHA-512; otherwise identical to
    /// [`Self::create_hmac_sha256`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivation`] if `key_identifier` is empty.
    pub fn create_hmac_sha512(key_identifier: &str) -> Result<Self, CryptoError> {
        Self::create_with_random_parameters(PseudorandomFunction::HmacSha512, key_identifier)
    }

    fn create_with_random_parameters(
        pseudorandom_function: PseudorandomFunction,
        key_identifier: &str,
    ) -> Result<Self, CryptoError> {
        let mut salt = vec![0u8; MIN_SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let jitter = OsRng.next_u32() & ITERATION_JITTER_MASK;
        let iterations = SUGGESTED_MIN_ITERATIONS.saturating_add(jitter);
        Self::new(
            pseudorandom_function,
            salt,
            iterations,
            DEFAULT_DERIVED_KEY_LEN,
            key_identifier,
        )
    }

    /// Derive key bytes from `password` using the stored parameters.
    ///
    /// Pure: the same password and entry always produce the same key.
    /// The result zeroizes itself on drop.
    #[must_use]
    pub fn derive_key_bytes(&self, password: &[u8]) -> Zeroizing<Vec<u8>> {
        let mut output = vec![0u8; self.derived_key_length_in_bytes as usize];
        match self.pseudorandom_function {
            PseudorandomFunction::HmacSha256 => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password, &self.salt, self.iterations, &mut output);
            }
            PseudorandomFunction::HmacSha512 => {
                pbkdf2::pbkdf2_hmac::<Sha512>(password, &self.salt, self.iterations, &mut output);
            }
        }
        Zeroizing::new(output)
    }

    /// Identifier linking sealed records to this entry.
    #[must_use]
    pub fn key_identifier(&self) -> &str {
        &self.key_identifier
    }

    /// The PRF this entry derives with.
    #[must_use]
    pub const fn pseudorandom_function(&self) -> PseudorandomFunction {
        self.pseudorandom_function
    }

    /// Stored salt.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Stored iteration count.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derived key length in bytes.
    #[must_use]
    pub const fn derived_key_length_in_bytes(&self) -> u32 {
        self.derived_key_length_in_bytes
    }

    /// Stored checksum (64 lowercase hex chars).
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Recompute the checksum from current content and compare with the
    /// stored value. `false` signals tampering or corruption; never errors.
    #[must_use]
    pub fn check_if_checksum_matches_content(&self) -> bool {
        self.checksum == self.compute_content_checksum()
    }

    fn compute_content_checksum(&self) -> String {
        compute_checksum(&[
            b"PBKDF2",
            self.pseudorandom_function.name().as_bytes(),
            &self.salt,
            &self.iterations.to_le_bytes(),
            &self.derived_key_length_in_bytes.to_le_bytes(),
            self.key_identifier.as_bytes(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SALT: &[u8; 16] = b"0123456789abcdef";

    fn test_entry() -> KeyDerivationFunctionEntry {
        KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            TEST_SALT.to_vec(),
            MIN_ITERATIONS,
            32,
            "primary",
        )
        .unwrap()
    }

    #[test]
    fn derive_is_deterministic() {
        let entry = test_entry();
        let a = entry.derive_key_bytes(b"password");
        let b = entry.derive_key_bytes(b"password");
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn different_passwords_produce_different_keys() {
        let entry = test_entry();
        assert_ne!(
            entry.derive_key_bytes(b"password_a").as_slice(),
            entry.derive_key_bytes(b"password_b").as_slice()
        );
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let a = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            b"salt_aaaaaaaaaaaa".to_vec(),
            MIN_ITERATIONS,
            32,
            "id",
        )
        .unwrap();
        let b = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            b"salt_bbbbbbbbbbbb".to_vec(),
            MIN_ITERATIONS,
            32,
            "id",
        )
        .unwrap();
        assert_ne!(
            a.derive_key_bytes(b"password").as_slice(),
            b.derive_key_bytes(b"password").as_slice()
        );
    }

    #[test]
    fn sha512_prf_derives_different_key_than_sha256() {
        let sha256 = test_entry();
        let sha512 = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha512,
            TEST_SALT.to_vec(),
            MIN_ITERATIONS,
            32,
            "primary",
        )
        .unwrap();
        assert_ne!(
            sha256.derive_key_bytes(b"password").as_slice(),
            sha512.derive_key_bytes(b"password").as_slice()
        );
    }

    #[test]
    fn rejects_short_salt() {
        let err = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            b"short".to_vec(),
            MIN_ITERATIONS,
            32,
            "id",
        )
        .unwrap_err();
        assert!(format!("{err}").contains("salt too short"));
    }

    #[test]
    fn rejects_low_iteration_count() {
        let err = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            TEST_SALT.to_vec(),
            MIN_ITERATIONS - 1,
            32,
            "id",
        )
        .unwrap_err();
        assert!(format!("{err}").contains("iteration count too low"));
    }

    #[test]
    fn rejects_short_derived_key() {
        let err = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            TEST_SALT.to_vec(),
            MIN_ITERATIONS,
            8,
            "id",
        )
        .unwrap_err();
        assert!(format!("{err}").contains("derived key too short"));
    }

    #[test]
    fn rejects_empty_key_identifier() {
        let err = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            TEST_SALT.to_vec(),
            MIN_ITERATIONS,
            32,
            "",
        )
        .unwrap_err();
        assert!(format!("{err}").contains("key identifier"));
    }

    #[test]
    fn convenience_constructor_jitters_iterations() {
        let entry = KeyDerivationFunctionEntry::create_hmac_sha256("id").unwrap();
        assert!(entry.iterations() >= SUGGESTED_MIN_ITERATIONS);
        assert!(entry.iterations() <= SUGGESTED_MIN_ITERATIONS + ITERATION_JITTER_MASK);
        assert_eq!(entry.salt().len(), MIN_SALT_LEN);
        assert_eq!(entry.derived_key_length_in_bytes(), 32);
    }

    #[test]
    fn convenience_constructors_do_not_share_salts() {
        let a = KeyDerivationFunctionEntry::create_hmac_sha512("id").unwrap();
        let b = KeyDerivationFunctionEntry::create_hmac_sha512("id").unwrap();
        assert_ne!(a.salt(), b.salt());
    }

    #[test]
    fn checksum_matches_after_construction() {
        let entry = test_entry();
        assert_eq!(entry.checksum().len(), 64);
        assert!(entry.check_if_checksum_matches_content());
    }

    #[test]
    fn serde_roundtrip_preserves_checksum() {
        let entry = KeyDerivationFunctionEntry::create_hmac_sha256("roundtrip").unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let restored: KeyDerivationFunctionEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, restored);
        assert!(restored.check_if_checksum_matches_content());
    }

    #[test]
    fn tampered_entry_fails_checksum_probe() {
        let entry = test_entry();
        let json = serde_json::to_string(&entry).unwrap();
        let tampered = json.replace("\"iterations\":4000", "\"iterations\":4001");
        assert_ne!(json, tampered);
        let restored: KeyDerivationFunctionEntry = serde_json::from_str(&tampered).unwrap();
        assert!(!restored.check_if_checksum_matches_content());
    }
}
