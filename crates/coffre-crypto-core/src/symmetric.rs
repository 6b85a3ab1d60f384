//! Versioned symmetric-key configurations — AES-CTR and ChaCha20.
//!
//! This module provides:
//! - [`SymmetricKeyAlgorithm`] — algorithm selector + per-algorithm
//!   nonce/counter state, serializable alongside the ciphertext it protects
//! - [`SymmetricKeyAlgorithm::encrypt_bytes`] / [`SymmetricKeyAlgorithm::decrypt_bytes`]
//!   — the stream-cipher transform (one function, both directions)
//! - [`SymmetricKeyAlgorithm::generate_new`] — the only sanctioned way to
//!   obtain a configuration for a new or updated ciphertext
//!
//! # Nonce discipline
//!
//! A configuration must never be reused across two different plaintexts
//! under the same key. Sealed records enforce this by calling
//! [`SymmetricKeyAlgorithm::generate_new`] on every payload mutation.
//! Direct construction with caller-supplied nonces exists for
//! deterministic tests and interop only.

use crate::error::CryptoError;
use chacha20::ChaCha20;
use ctr::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// AES-CTR initial counter (IV) length in bytes — one AES block.
pub const AES_CTR_COUNTER_LEN: usize = 16;

/// ChaCha20 nonce length in bytes (96 bits, IETF variant).
pub const CHACHA20_NONCE_LEN: usize = 12;

/// ChaCha20 keystream block length in bytes.
const CHACHA20_BLOCK_LEN: u64 = 64;

/// Key size used by [`SymmetricKeyAlgorithm::generate_new`] (256 bits).
pub const GENERATED_KEY_SIZE_BITS: u32 = 256;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type Aes192Ctr = ctr::Ctr128BE<aes::Aes192>;
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Algorithm selector for [`SymmetricKeyAlgorithm`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetricAlgorithm {
    /// AES in counter mode (128/192/256-bit keys).
    #[serde(rename = "AES_CTR")]
    AesCtr,
    /// ChaCha20 stream cipher, IETF variant (256-bit keys only).
    ChaCha20,
}

impl SymmetricAlgorithm {
    /// Stable algorithm name used in checksum input and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AesCtr => "AES_CTR",
            Self::ChaCha20 => "ChaCha20",
        }
    }
}

/// AES-CTR state: the initial counter block (a.k.a. the IV).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AesCtrSettings {
    /// 16-byte initial counter, incremented per block by the mode.
    pub initial_counter: [u8; AES_CTR_COUNTER_LEN],
}

impl AesCtrSettings {
    /// Wrap an explicit initial counter (deterministic tests, interop).
    #[must_use]
    pub const fn new(initial_counter: [u8; AES_CTR_COUNTER_LEN]) -> Self {
        Self { initial_counter }
    }

    /// Fresh settings with a cryptographically random initial counter.
    #[must_use]
    pub fn random() -> Self {
        let mut initial_counter = [0u8; AES_CTR_COUNTER_LEN];
        OsRng.fill_bytes(&mut initial_counter);
        Self { initial_counter }
    }

    /// Build from a byte slice of dynamic length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encryption`] if `bytes` is not exactly
    /// 16 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let initial_counter: [u8; AES_CTR_COUNTER_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::Encryption(format!(
                "invalid AES-CTR initial counter length: {} bytes (expected {AES_CTR_COUNTER_LEN})",
                bytes.len()
            ))
        })?;
        Ok(Self { initial_counter })
    }
}

/// ChaCha20 state: 96-bit nonce + 32-bit initial block counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaCha20Settings {
    /// 12-byte nonce, unique per (key, plaintext) pair.
    pub nonce: [u8; CHACHA20_NONCE_LEN],
    /// Initial block counter the keystream starts from.
    pub counter: u32,
}

impl ChaCha20Settings {
    /// Wrap an explicit nonce and counter (deterministic tests, interop).
    #[must_use]
    pub const fn new(nonce: [u8; CHACHA20_NONCE_LEN], counter: u32) -> Self {
        Self { nonce, counter }
    }

    /// Fresh settings with a cryptographically random nonce.
    ///
    /// The counter starts at zero — uniqueness comes from the 96-bit
    /// nonce, and a zero start leaves the full keystream for the payload.
    #[must_use]
    pub fn random() -> Self {
        let mut nonce = [0u8; CHACHA20_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        Self { nonce, counter: 0 }
    }

    /// Build from a nonce slice of dynamic length plus a counter.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encryption`] if `nonce` is not exactly
    /// 12 bytes long.
    pub fn from_slice(nonce: &[u8], counter: u32) -> Result<Self, CryptoError> {
        let nonce: [u8; CHACHA20_NONCE_LEN] = nonce.try_into().map_err(|_| {
            CryptoError::Encryption(format!(
                "invalid ChaCha20 nonce length: {} bytes (expected {CHACHA20_NONCE_LEN})",
                nonce.len()
            ))
        })?;
        Ok(Self { nonce, counter })
    }
}

/// Per-algorithm settings payload — exactly one variant, selected by the
/// `algorithm` tag in the persisted form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
pub enum CipherSettings {
    /// AES-CTR initial counter.
    #[serde(rename = "AES_CTR")]
    AesCtr(AesCtrSettings),
    /// ChaCha20 nonce + counter.
    ChaCha20(ChaCha20Settings),
}

impl CipherSettings {
    /// The algorithm this settings payload belongs to.
    #[must_use]
    pub const fn algorithm(&self) -> SymmetricAlgorithm {
        match self {
            Self::AesCtr(_) => SymmetricAlgorithm::AesCtr,
            Self::ChaCha20(_) => SymmetricAlgorithm::ChaCha20,
        }
    }
}

/// A symmetric-key configuration: algorithm, key size, and nonce/counter
/// state. Stored in plaintext next to the ciphertext it was used for.
#[must_use = "a configuration must be stored with the ciphertext it encrypted"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricKeyAlgorithm {
    /// Key size in bits — AES: 128/192/256, ChaCha20: 256.
    key_size_in_bits: u32,
    /// Per-algorithm nonce/counter state.
    settings: CipherSettings,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Expected raw key length in bytes for an allowed key size, or `None`
/// for sizes the algorithm does not support.
const fn allowed_key_len(algorithm: SymmetricAlgorithm, key_size_in_bits: u32) -> Option<usize> {
    match (algorithm, key_size_in_bits) {
        (SymmetricAlgorithm::AesCtr, 128) => Some(16),
        (SymmetricAlgorithm::AesCtr, 192) => Some(24),
        (SymmetricAlgorithm::AesCtr, 256) | (SymmetricAlgorithm::ChaCha20, 256) => Some(32),
        _ => None,
    }
}

impl SymmetricKeyAlgorithm {
    /// Build a configuration from explicit settings and key size.
    ///
    /// Intended for deterministic tests and interop with externally
    /// generated parameters — new ciphertexts should use
    /// [`Self::generate_new`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedKeySize`] if `key_size_in_bits`
    /// is not an allowed key length for the settings' algorithm.
    pub fn new(settings: CipherSettings, key_size_in_bits: u32) -> Result<Self, CryptoError> {
        let algorithm = settings.algorithm();
        if allowed_key_len(algorithm, key_size_in_bits).is_none() {
            return Err(CryptoError::UnsupportedKeySize(
                key_size_in_bits,
                algorithm.name(),
            ));
        }
        Ok(Self {
            key_size_in_bits,
            settings,
        })
    }

    /// Fresh configuration with random nonce/initial-counter and a
    /// 256-bit key size.
    ///
    /// This is the only sanctioned way to obtain a configuration for a
    /// new or updated ciphertext.
    pub fn generate_new(algorithm: SymmetricAlgorithm) -> Self {
        let settings = match algorithm {
            SymmetricAlgorithm::AesCtr => CipherSettings::AesCtr(AesCtrSettings::random()),
            SymmetricAlgorithm::ChaCha20 => CipherSettings::ChaCha20(ChaCha20Settings::random()),
        };
        Self {
            key_size_in_bits: GENERATED_KEY_SIZE_BITS,
            settings,
        }
    }

    /// The algorithm this configuration selects.
    #[must_use]
    pub const fn algorithm(&self) -> SymmetricAlgorithm {
        self.settings.algorithm()
    }

    /// Key size in bits.
    #[must_use]
    pub const fn key_size_in_bits(&self) -> u32 {
        self.key_size_in_bits
    }

    /// The per-algorithm settings payload.
    #[must_use]
    pub const fn settings(&self) -> &CipherSettings {
        &self.settings
    }
}

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

impl SymmetricKeyAlgorithm {
    /// Encrypt `data` with `key` using this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyMaterial`] if `key` does not match
    /// `key_size_in_bits`, or [`CryptoError::Encryption`] if the keystream
    /// cannot cover the payload (ChaCha20 counter exhaustion).
    pub fn encrypt_bytes(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let expected = allowed_key_len(self.algorithm(), self.key_size_in_bits)
            .ok_or(CryptoError::UnsupportedKeySize(
                self.key_size_in_bits,
                self.algorithm().name(),
            ))?;
        if key.len() != expected {
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "key is {} bytes, configuration requires {expected} ({} bits)",
                key.len(),
                self.key_size_in_bits
            )));
        }

        match &self.settings {
            CipherSettings::AesCtr(s) => aes_ctr_transform(data, key, &s.initial_counter),
            CipherSettings::ChaCha20(s) => chacha20_transform(data, key, &s.nonce, s.counter),
        }
    }

    /// Decrypt `data` with `key` — the same keystream transform as
    /// [`Self::encrypt_bytes`] (stream-cipher symmetry), so
    /// `decrypt_bytes(encrypt_bytes(x, k), k) == x`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::encrypt_bytes`].
    pub fn decrypt_bytes(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.encrypt_bytes(data, key)
    }

    /// Canonical byte encoding of {algorithm name, key size, settings},
    /// used as checksum input. Stable and order-preserving — changing any
    /// component changes the output.
    #[must_use]
    pub fn settings_as_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(self.algorithm().name().as_bytes());
        out.extend_from_slice(&self.key_size_in_bits.to_le_bytes());
        match &self.settings {
            CipherSettings::AesCtr(s) => out.extend_from_slice(&s.initial_counter),
            CipherSettings::ChaCha20(s) => {
                out.extend_from_slice(&s.nonce);
                out.extend_from_slice(&s.counter.to_le_bytes());
            }
        }
        out
    }
}

/// Apply the AES-CTR keystream to `data`, selecting the AES variant by
/// key length (validated by the caller against the configuration).
fn aes_ctr_transform(
    data: &[u8],
    key: &[u8],
    initial_counter: &[u8; AES_CTR_COUNTER_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let mut buf = data.to_vec();
    match key.len() {
        16 => {
            let mut cipher = Aes128Ctr::new_from_slices(key, initial_counter)
                .map_err(|_| CryptoError::Encryption("failed to initialize AES-128-CTR".into()))?;
            cipher.apply_keystream(&mut buf);
        }
        24 => {
            let mut cipher = Aes192Ctr::new_from_slices(key, initial_counter)
                .map_err(|_| CryptoError::Encryption("failed to initialize AES-192-CTR".into()))?;
            cipher.apply_keystream(&mut buf);
        }
        32 => {
            let mut cipher = Aes256Ctr::new_from_slices(key, initial_counter)
                .map_err(|_| CryptoError::Encryption("failed to initialize AES-256-CTR".into()))?;
            cipher.apply_keystream(&mut buf);
        }
        other => {
            buf.zeroize();
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "AES key must be 16, 24 or 32 bytes, got {other}"
            )));
        }
    }
    Ok(buf)
}

/// Apply the ChaCha20 keystream to `data`, starting at the configured
/// block counter.
fn chacha20_transform(
    data: &[u8],
    key: &[u8],
    nonce: &[u8; CHACHA20_NONCE_LEN],
    counter: u32,
) -> Result<Vec<u8>, CryptoError> {
    let mut cipher = ChaCha20::new_from_slices(key, nonce)
        .map_err(|_| CryptoError::Encryption("failed to initialize ChaCha20".into()))?;

    // Position the keystream at the initial block counter.
    let offset = u64::from(counter).saturating_mul(CHACHA20_BLOCK_LEN);
    cipher
        .try_seek(offset)
        .map_err(|_| CryptoError::Encryption("ChaCha20 counter out of keystream range".into()))?;

    let mut buf = data.to_vec();
    if cipher.try_apply_keystream(&mut buf).is_err() {
        buf.zeroize();
        return Err(CryptoError::Encryption(
            "ChaCha20 keystream exhausted for payload length".into(),
        ));
    }
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
