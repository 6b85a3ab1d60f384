//! History — an append-style log line recording a vault event.

use coffre_crypto_core::checksum::compute_checksum;
use coffre_crypto_core::symmetric::SymmetricKeyAlgorithm;
use serde::{Deserialize, Serialize};

use crate::clock::now_unix;
use crate::envelope::{
    require_text, require_time, EnvelopeMap, EnvelopeValue, CREATION_TIME_KEY,
    MODIFICATION_TIME_KEY,
};
use crate::error::SecretError;
use crate::sealed::SealedEnvelope;

pub(crate) const EVENT_TEXT_KEY: &str = "event_text";

/// A plaintext history entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    event_text: String,
    creation_time: i64,
    modification_time: i64,
    checksum: String,
}

impl History {
    /// New entry stamped with the current time.
    #[must_use]
    pub fn new(event_text: &str) -> Self {
        Self::with_time(event_text, now_unix())
    }

    /// New entry with an explicit timestamp.
    #[must_use]
    pub fn with_time(event_text: &str, time: i64) -> Self {
        Self::from_parts(event_text, time, time)
    }

    /// Reconstruct with explicit creation and modification times.
    #[must_use]
    pub fn from_parts(event_text: &str, creation_time: i64, modification_time: i64) -> Self {
        let mut entry = Self {
            event_text: event_text.to_owned(),
            creation_time,
            modification_time,
            checksum: String::new(),
        };
        entry.checksum = entry.compute_content_checksum();
        entry
    }

    /// Event text.
    #[must_use]
    pub fn event_text(&self) -> &str {
        &self.event_text
    }

    /// Creation time (Unix seconds).
    #[must_use]
    pub const fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// Modification time (Unix seconds).
    #[must_use]
    pub const fn modification_time(&self) -> i64 {
        self.modification_time
    }

    /// Stored checksum.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Replace the event text, re-stamp, refresh the checksum.
    pub fn update_event_text(&mut self, event_text: &str) {
        self.event_text = event_text.to_owned();
        self.modification_time = now_unix();
        self.checksum = self.compute_content_checksum();
    }

    /// Recompute the checksum and compare with the stored value.
    #[must_use]
    pub fn check_if_checksum_matches_content(&self) -> bool {
        self.checksum == self.compute_content_checksum()
    }

    /// Flatten into the typed map sealed records encrypt.
    #[must_use]
    pub fn to_envelope_map(&self) -> EnvelopeMap {
        let mut map = EnvelopeMap::new();
        map.insert(
            EVENT_TEXT_KEY.to_owned(),
            EnvelopeValue::Text(self.event_text.clone()),
        );
        map.insert(
            CREATION_TIME_KEY.to_owned(),
            EnvelopeValue::UnixTime(self.creation_time),
        );
        map.insert(
            MODIFICATION_TIME_KEY.to_owned(),
            EnvelopeValue::UnixTime(self.modification_time),
        );
        map
    }

    fn compute_content_checksum(&self) -> String {
        compute_checksum(&[
            self.event_text.as_bytes(),
            &self.creation_time.to_le_bytes(),
            &self.modification_time.to_le_bytes(),
        ])
    }
}

/// A history entry held as ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySecret {
    sealed: SealedEnvelope,
}

impl HistorySecret {
    /// Seal a plaintext history entry.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::seal`] failures.
    pub fn new(
        history: &History,
        key_identifier: &str,
        algorithm: SymmetricKeyAlgorithm,
        derived_key: &[u8],
    ) -> Result<Self, SecretError> {
        Self::from_map(
            &history.to_envelope_map(),
            key_identifier,
            algorithm,
            derived_key,
        )
    }

    /// Seal a caller-assembled map (escape hatch).
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::seal`] failures.
    pub fn from_map(
        map: &EnvelopeMap,
        key_identifier: &str,
        algorithm: SymmetricKeyAlgorithm,
        derived_key: &[u8],
    ) -> Result<Self, SecretError> {
        Ok(Self {
            sealed: SealedEnvelope::seal(map, key_identifier, algorithm, derived_key)?,
        })
    }

    /// Decrypt and return the event text.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn event_text(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(EVENT_TEXT_KEY, derived_key)
    }

    /// Decrypt and return the creation time.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn creation_time(&self, derived_key: &[u8]) -> Result<i64, SecretError> {
        self.sealed.time_field(CREATION_TIME_KEY, derived_key)
    }

    /// Decrypt and return the modification time.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn modification_time(&self, derived_key: &[u8]) -> Result<i64, SecretError> {
        self.sealed.time_field(MODIFICATION_TIME_KEY, derived_key)
    }

    /// Replace the event text. `true` on success.
    pub fn set_event_text(&mut self, event_text: &str, derived_key: &[u8]) -> bool {
        self.sealed.set_field(
            EVENT_TEXT_KEY,
            EnvelopeValue::Text(event_text.to_owned()),
            derived_key,
        )
    }

    /// Non-destructive password probe. Never errors.
    #[must_use]
    pub fn can_be_decrypted_with(&self, derived_key: &[u8]) -> bool {
        self.sealed.can_open_with(derived_key)
    }

    /// Full decrypt back to a plaintext [`History`], timestamps verbatim.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn to_history(&self, derived_key: &[u8]) -> Result<History, SecretError> {
        let map = self.sealed.open(derived_key)?;
        Ok(History::from_parts(
            &require_text(&map, EVENT_TEXT_KEY)?,
            require_time(&map, CREATION_TIME_KEY)?,
            require_time(&map, MODIFICATION_TIME_KEY)?,
        ))
    }

    /// Identifier of the key-derivation entry for this record.
    #[must_use]
    pub fn key_identifier(&self) -> &str {
        self.sealed.key_identifier()
    }

    /// The configuration of the current ciphertext.
    #[must_use]
    pub const fn algorithm(&self) -> &SymmetricKeyAlgorithm {
        self.sealed.algorithm()
    }

    /// Stored checksum.
    #[must_use]
    pub fn checksum(&self) -> &str {
        self.sealed.checksum()
    }

    /// Recompute the checksum and compare with the stored value.
    #[must_use]
    pub fn check_if_checksum_matches_content(&self) -> bool {
        self.sealed.check_if_checksum_matches_content()
    }
}
