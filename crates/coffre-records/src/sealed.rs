//! Sealed-record engine shared by every `*Secret` type.
//!
//! A [`SealedEnvelope`] holds ciphertext plus the plaintext metadata
//! needed to use it: the key identifier naming which derived key opens
//! it, the [`SymmetricKeyAlgorithm`] configuration it was encrypted
//! under, and a checksum over all three. Plaintext fields exist only
//! transiently, inside a single getter or setter call — every read
//! decrypts the full envelope, every write decrypts, mutates, and
//! re-encrypts under a freshly generated configuration.
//!
//! Setters deliberately collapse all failures into a `bool`: callers
//! distinguish "wrong password" from "corrupt data" only through the
//! probe operations, never through setter error detail.

use coffre_crypto_core::checksum::compute_checksum;
use coffre_crypto_core::symmetric::SymmetricKeyAlgorithm;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::clock::now_unix;
use crate::envelope::{
    self, require_bytes, require_text, require_time, EnvelopeMap, EnvelopeValue,
    MODIFICATION_TIME_KEY,
};
use crate::error::SecretError;

/// Ciphertext plus plaintext metadata for one encrypted record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// Identifier of the key-derivation entry whose key opens this record.
    key_identifier: String,
    /// Encrypted typed-map envelope.
    #[serde(with = "crate::envelope::base64_bytes")]
    ciphertext: Vec<u8>,
    /// Configuration the ciphertext was produced under.
    algorithm: SymmetricKeyAlgorithm,
    /// Checksum over key identifier, ciphertext, and algorithm settings.
    checksum: String,
}

impl SealedEnvelope {
    /// Serialize `map` through the envelope codec, encrypt it, and wrap
    /// the result with its metadata and checksum.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::EmptyDerivedKey`] for an empty key,
    /// [`SecretError::EnvelopeSerialization`] if the codec rejects the
    /// map, or a crypto error if the key does not fit `algorithm`.
    pub fn seal(
        map: &EnvelopeMap,
        key_identifier: &str,
        algorithm: SymmetricKeyAlgorithm,
        derived_key: &[u8],
    ) -> Result<Self, SecretError> {
        if derived_key.is_empty() {
            return Err(SecretError::EmptyDerivedKey);
        }
        let mut envelope_bytes = envelope::serialize_map(map)?;
        let ciphertext = algorithm.encrypt_bytes(&envelope_bytes, derived_key);
        envelope_bytes.zeroize();

        let mut sealed = Self {
            key_identifier: key_identifier.to_owned(),
            ciphertext: ciphertext?,
            algorithm,
            checksum: String::new(),
        };
        sealed.checksum = sealed.compute_content_checksum();
        Ok(sealed)
    }

    /// Decrypt and validate the full envelope, returning the typed map.
    ///
    /// The map is the *unsealed-transient* state: callers extract what
    /// they need and let it drop.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::EmptyDerivedKey`] for an empty key, or
    /// [`SecretError::MalformedEnvelope`] if the decrypted bytes do not
    /// parse (wrong key or corrupted ciphertext).
    pub fn open(&self, derived_key: &[u8]) -> Result<EnvelopeMap, SecretError> {
        if derived_key.is_empty() {
            return Err(SecretError::EmptyDerivedKey);
        }
        let mut plaintext = self.algorithm.decrypt_bytes(&self.ciphertext, derived_key)?;
        let result = envelope::deserialize_map(&plaintext);
        plaintext.zeroize();
        result
    }

    /// Decrypt and return one text field.
    ///
    /// # Errors
    ///
    /// Open failures as in [`Self::open`], plus
    /// [`SecretError::FieldNotFound`] / [`SecretError::FieldKindMismatch`].
    pub fn text_field(&self, field: &str, derived_key: &[u8]) -> Result<String, SecretError> {
        require_text(&self.open(derived_key)?, field)
    }

    /// Decrypt and return one byte field.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::text_field`].
    pub fn bytes_field(&self, field: &str, derived_key: &[u8]) -> Result<Vec<u8>, SecretError> {
        require_bytes(&self.open(derived_key)?, field)
    }

    /// Decrypt and return one timestamp field.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::text_field`].
    pub fn time_field(&self, field: &str, derived_key: &[u8]) -> Result<i64, SecretError> {
        require_time(&self.open(derived_key)?, field)
    }

    /// Copy-on-write setter: decrypt, overwrite `field` and the
    /// modification time, re-encrypt under a freshly generated
    /// configuration, recompute the checksum.
    ///
    /// Returns `true` on success. Any failure — wrong key, corrupt
    /// ciphertext, codec rejection — returns `false` and leaves the
    /// stored ciphertext, algorithm, and checksum untouched.
    pub fn set_field(&mut self, field: &str, value: EnvelopeValue, derived_key: &[u8]) -> bool {
        self.try_set_field(field, value, derived_key).is_ok()
    }

    fn try_set_field(
        &mut self,
        field: &str,
        value: EnvelopeValue,
        derived_key: &[u8],
    ) -> Result<(), SecretError> {
        let mut map = self.open(derived_key)?;
        map.insert(field.to_owned(), value);
        map.insert(
            MODIFICATION_TIME_KEY.to_owned(),
            EnvelopeValue::UnixTime(now_unix()),
        );
        // Never reuse a nonce/counter for the mutated payload.
        let fresh = SymmetricKeyAlgorithm::generate_new(self.algorithm.algorithm());
        *self = Self::seal(&map, &self.key_identifier, fresh, derived_key)?;
        Ok(())
    }

    /// Non-destructive password probe: `true` iff the key decrypts this
    /// record to a well-formed envelope. Never errors.
    #[must_use]
    pub fn can_open_with(&self, derived_key: &[u8]) -> bool {
        self.open(derived_key).is_ok()
    }

    /// Identifier of the key-derivation entry for this record.
    #[must_use]
    pub fn key_identifier(&self) -> &str {
        &self.key_identifier
    }

    /// The stored ciphertext (opaque envelope bytes).
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The configuration the current ciphertext was produced under.
    #[must_use]
    pub const fn algorithm(&self) -> &SymmetricKeyAlgorithm {
        &self.algorithm
    }

    /// Stored checksum (64 lowercase hex chars).
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Recompute the checksum from current content and compare with the
    /// stored value. Never errors; mismatches are only ever reported,
    /// never corrected.
    #[must_use]
    pub fn check_if_checksum_matches_content(&self) -> bool {
        self.checksum == self.compute_content_checksum()
    }

    fn compute_content_checksum(&self) -> String {
        compute_checksum(&[
            self.key_identifier.as_bytes(),
            &self.ciphertext,
            &self.algorithm.settings_as_bytes(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use coffre_crypto_core::symmetric::{AesCtrSettings, CipherSettings, SymmetricKeyAlgorithm};

    const KEY: [u8; 32] = [0xAB; 32];
    const WRONG_KEY: [u8; 32] = [0xBA; 32];

    fn fixed_algorithm() -> SymmetricKeyAlgorithm {
        SymmetricKeyAlgorithm::new(
            CipherSettings::AesCtr(AesCtrSettings::new([0x42; 16])),
            256,
        )
        .unwrap()
    }

    fn sample_map() -> EnvelopeMap {
        let mut map = EnvelopeMap::new();
        map.insert("title".into(), EnvelopeValue::Text("launch codes".into()));
        map.insert("blob".into(), EnvelopeValue::Bytes(vec![9, 9, 9]));
        map.insert("creation_time".into(), EnvelopeValue::UnixTime(1_000));
        map.insert(MODIFICATION_TIME_KEY.into(), EnvelopeValue::UnixTime(1_000));
        map
    }

    fn sample_sealed() -> SealedEnvelope {
        SealedEnvelope::seal(&sample_map(), "key-1", fixed_algorithm(), &KEY).unwrap()
    }

    #[test]
    fn seal_then_open_roundtrips_the_map() {
        let sealed = sample_sealed();
        assert_eq!(sealed.open(&KEY).unwrap(), sample_map());
    }

    #[test]
    fn seal_rejects_empty_key() {
        let err =
            SealedEnvelope::seal(&sample_map(), "key-1", fixed_algorithm(), &[]).unwrap_err();
        assert!(matches!(err, SecretError::EmptyDerivedKey));
    }

    #[test]
    fn open_rejects_empty_key() {
        let sealed = sample_sealed();
        assert!(matches!(
            sealed.open(&[]).unwrap_err(),
            SecretError::EmptyDerivedKey
        ));
    }

    #[test]
    fn open_with_wrong_key_is_a_malformed_envelope() {
        let sealed = sample_sealed();
        assert!(matches!(
            sealed.open(&WRONG_KEY).unwrap_err(),
            SecretError::MalformedEnvelope(_)
        ));
    }

    #[test]
    fn typed_getters_return_field_values() {
        let sealed = sample_sealed();
        assert_eq!(sealed.text_field("title", &KEY).unwrap(), "launch codes");
        assert_eq!(sealed.bytes_field("blob", &KEY).unwrap(), vec![9, 9, 9]);
        assert_eq!(sealed.time_field("creation_time", &KEY).unwrap(), 1_000);
    }

    #[test]
    fn missing_field_and_kind_mismatch_are_distinct_errors() {
        let sealed = sample_sealed();
        assert!(matches!(
            sealed.text_field("absent", &KEY).unwrap_err(),
            SecretError::FieldNotFound(_)
        ));
        assert!(matches!(
            sealed.time_field("title", &KEY).unwrap_err(),
            SecretError::FieldKindMismatch { .. }
        ));
    }

    #[test]
    fn set_field_rewrites_payload_and_regenerates_algorithm() {
        let mut sealed = sample_sealed();
        let settings_before = sealed.algorithm().settings().clone();
        let ciphertext_before = sealed.ciphertext().to_vec();
        let checksum_before = sealed.checksum().to_owned();

        assert!(sealed.set_field("title", EnvelopeValue::Text("renamed".into()), &KEY));

        assert_eq!(sealed.text_field("title", &KEY).unwrap(), "renamed");
        assert_ne!(sealed.algorithm().settings(), &settings_before);
        assert_ne!(sealed.ciphertext(), ciphertext_before.as_slice());
        assert_ne!(sealed.checksum(), checksum_before);
        assert!(sealed.check_if_checksum_matches_content());
        // Untouched fields survive the rewrite.
        assert_eq!(sealed.bytes_field("blob", &KEY).unwrap(), vec![9, 9, 9]);
    }

    #[test]
    fn set_field_bumps_modification_time() {
        let mut sealed = sample_sealed();
        assert!(sealed.set_field("title", EnvelopeValue::Text("renamed".into()), &KEY));
        let bumped = sealed.time_field(MODIFICATION_TIME_KEY, &KEY).unwrap();
        assert!(bumped > 1_000);
        // Creation time is not touched by setters.
        assert_eq!(sealed.time_field("creation_time", &KEY).unwrap(), 1_000);
    }

    #[test]
    fn set_field_with_wrong_key_fails_and_leaves_record_unchanged() {
        let mut sealed = sample_sealed();
        let before = sealed.clone();
        assert!(!sealed.set_field("title", EnvelopeValue::Text("evil".into()), &WRONG_KEY));
        assert_eq!(sealed, before);
    }

    #[test]
    fn set_field_with_empty_key_fails() {
        let mut sealed = sample_sealed();
        assert!(!sealed.set_field("title", EnvelopeValue::Text("x".into()), &[]));
    }

    #[test]
    fn probe_accepts_right_key_and_rejects_everything_else() {
        let sealed = sample_sealed();
        assert!(sealed.can_open_with(&KEY));
        assert!(!sealed.can_open_with(&WRONG_KEY));
        assert!(!sealed.can_open_with(&[]));

        // Any single altered key byte must fail closed.
        let mut altered = KEY;
        altered[7] ^= 0x01;
        assert!(!sealed.can_open_with(&altered));
    }

    #[test]
    fn checksum_matches_after_seal_and_detects_tampering() {
        let sealed = sample_sealed();
        assert_eq!(sealed.checksum().len(), 64);
        assert!(sealed.check_if_checksum_matches_content());

        let mut tampered = sealed;
        if let Some(byte) = tampered.ciphertext.first_mut() {
            *byte ^= 0xFF;
        }
        assert!(!tampered.check_if_checksum_matches_content());
    }

    #[test]
    fn serde_roundtrip_preserves_checksum_and_ciphertext() {
        let sealed = sample_sealed();
        let json = serde_json::to_string(&sealed).unwrap();
        let restored: SealedEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(sealed, restored);
        assert!(restored.can_open_with(&KEY));
    }
}
