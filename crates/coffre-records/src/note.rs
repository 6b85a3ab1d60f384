//! Notes — a titled piece of free text, plaintext or sealed.

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

pub(crate) const NOTE_TITLE_KEY: &str = "note_title";
pub(crate) const NOTE_TEXT_KEY: &str = "note_text";

// ---------------------------------------------------------------------------
// Plaintext form
// ---------------------------------------------------------------------------

/// A plaintext note. Mutate only through the `update_*` operations so the
/// modification time and checksum stay coherent; `Clone` is the deep copy
/// (owned buffers, checksum carried over verbatim and still valid).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    note_title: String,
    note_text: String,
    creation_time: i64,
    modification_time: i64,
    checksum: String,
}

impl Note {
    /// New note stamped with the current time.
    #[must_use]
    pub fn new(note_title: &str, note_text: &str) -> Self {
        Self::with_time(note_title, note_text, now_unix())
    }

    /// New note with an explicit timestamp (deterministic tests, imports).
    #[must_use]
    pub fn with_time(note_title: &str, note_text: &str, time: i64) -> Self {
        Self::from_parts(note_title, note_text, time, time)
    }

    /// Reconstruct a note with explicit creation and modification times —
    /// the sealed→plaintext downgrade path and importers use this to
    /// preserve both timestamps verbatim.
    #[must_use]
    pub fn from_parts(
        note_title: &str,
        note_text: &str,
        creation_time: i64,
        modification_time: i64,
    ) -> Self {
        let mut note = Self {
            note_title: note_title.to_owned(),
            note_text: note_text.to_owned(),
            creation_time,
            modification_time,
            checksum: String::new(),
        };
        note.checksum = note.compute_content_checksum();
        note
    }

    /// Note title.
    #[must_use]
    pub fn note_title(&self) -> &str {
        &self.note_title
    }

    /// Note body.
    #[must_use]
    pub fn note_text(&self) -> &str {
        &self.note_text
    }

    /// Creation time (Unix seconds). Set once at construction.
    #[must_use]
    pub const fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// Modification time (Unix seconds). Re-stamped by every update.
    #[must_use]
    pub const fn modification_time(&self) -> i64 {
        self.modification_time
    }

    /// Stored checksum (64 lowercase hex chars).
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Replace the title, re-stamp the modification time, refresh the
    /// checksum.
    pub fn update_note_title(&mut self, note_title: &str) {
        self.note_title = note_title.to_owned();
        self.touch();
    }

    /// Replace the body, re-stamp the modification time, refresh the
    /// checksum.
    pub fn update_note_text(&mut self, note_text: &str) {
        self.note_text = note_text.to_owned();
        self.touch();
    }

    /// Replace title and body together with a single re-stamp.
    pub fn update_note(&mut self, note_title: &str, note_text: &str) {
        self.note_title = note_title.to_owned();
        self.note_text = note_text.to_owned();
        self.touch();
    }

    /// Recompute the checksum from current content and compare with the
    /// stored value. Never errors.
    #[must_use]
    pub fn check_if_checksum_matches_content(&self) -> bool {
        self.checksum == self.compute_content_checksum()
    }

    /// Flatten into the typed map sealed records encrypt. Timestamps are
    /// stored timestamp-typed, content as its natural kind.
    #[must_use]
    pub fn to_envelope_map(&self) -> EnvelopeMap {
        let mut map = EnvelopeMap::new();
        map.insert(
            NOTE_TITLE_KEY.to_owned(),
            EnvelopeValue::Text(self.note_title.clone()),
        );
        map.insert(
            NOTE_TEXT_KEY.to_owned(),
            EnvelopeValue::Text(self.note_text.clone()),
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

    fn touch(&mut self) {
        self.modification_time = now_unix();
        self.checksum = self.compute_content_checksum();
    }

    fn compute_content_checksum(&self) -> String {
        compute_checksum(&[
            self.note_title.as_bytes(),
            self.note_text.as_bytes(),
            &self.creation_time.to_le_bytes(),
            &self.modification_time.to_le_bytes(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Sealed form
// ---------------------------------------------------------------------------

/// A note held as ciphertext. Fields are decrypted on demand, one getter
/// call at a time; setters rewrite the whole payload under a fresh
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteSecret {
    sealed: SealedEnvelope,
}

impl NoteSecret {
    /// Seal a plaintext note.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::seal`] failures.
    pub fn new(
        note: &Note,
        key_identifier: &str,
        algorithm: SymmetricKeyAlgorithm,
        derived_key: &[u8],
    ) -> Result<Self, SecretError> {
        Self::from_map(&note.to_envelope_map(), key_identifier, algorithm, derived_key)
    }

    /// Seal a caller-assembled map instead of a [`Note`]. Escape hatch
    /// for non-standard payloads — the caller is responsible for
    /// including every key the getters expect.
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

    /// Decrypt and return the title.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn note_title(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(NOTE_TITLE_KEY, derived_key)
    }

    /// Decrypt and return the body.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn note_text(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(NOTE_TEXT_KEY, derived_key)
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

    /// Replace the title. `true` on success, `false` on any failure.
    pub fn set_note_title(&mut self, note_title: &str, derived_key: &[u8]) -> bool {
        self.sealed.set_field(
            NOTE_TITLE_KEY,
            EnvelopeValue::Text(note_title.to_owned()),
            derived_key,
        )
    }

    /// Replace the body. `true` on success, `false` on any failure.
    pub fn set_note_text(&mut self, note_text: &str, derived_key: &[u8]) -> bool {
        self.sealed.set_field(
            NOTE_TEXT_KEY,
            EnvelopeValue::Text(note_text.to_owned()),
            derived_key,
        )
    }

    /// Non-destructive password probe. Never errors.
    #[must_use]
    pub fn can_be_decrypted_with(&self, derived_key: &[u8]) -> bool {
        self.sealed.can_open_with(derived_key)
    }

    /// Full decrypt back to a plaintext [`Note`], both timestamps copied
    /// verbatim. One-directional: discarding the sealed form afterwards
    /// is the caller's decision.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn to_note(&self, derived_key: &[u8]) -> Result<Note, SecretError> {
        let map = self.sealed.open(derived_key)?;
        Ok(Note::from_parts(
            &require_text(&map, NOTE_TITLE_KEY)?,
            &require_text(&map, NOTE_TEXT_KEY)?,
            require_time(&map, CREATION_TIME_KEY)?,
            require_time(&map, MODIFICATION_TIME_KEY)?,
        ))
    }

    /// Identifier of the key-derivation entry for this record (plaintext).
    #[must_use]
    pub fn key_identifier(&self) -> &str {
        self.sealed.key_identifier()
    }

    /// The configuration of the current ciphertext (plaintext metadata).
    #[must_use]
    pub const fn algorithm(&self) -> &SymmetricKeyAlgorithm {
        self.sealed.algorithm()
    }

    /// Stored checksum (plaintext metadata).
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

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use coffre_crypto_core::symmetric::SymmetricAlgorithm;

    const KEY: [u8; 32] = [0x5E; 32];

    fn fresh_algorithm() -> SymmetricKeyAlgorithm {
        SymmetricKeyAlgorithm::generate_new(SymmetricAlgorithm::AesCtr)
    }

    #[test]
    fn new_note_has_valid_checksum_and_equal_timestamps() {
        let note = Note::new("Some topic", "Some text");
        assert!(note.check_if_checksum_matches_content());
        assert_eq!(note.creation_time(), note.modification_time());
        assert_eq!(note.checksum().len(), 64);
    }

    #[test]
    fn identical_content_and_time_means_identical_checksum() {
        let a = Note::with_time("Same", "Same", 1_555_555_555);
        let b = Note::with_time("Same", "Same", 1_555_555_555);
        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn updates_keep_checksum_valid_and_change_it() {
        let mut note = Note::with_time("Title", "Text", 1_555_555_555);
        let before = note.checksum().to_owned();
        note.update_note_text("Different text");
        assert!(note.check_if_checksum_matches_content());
        assert_ne!(note.checksum(), before);
        assert_eq!(note.note_text(), "Different text");
    }

    #[test]
    fn combined_update_replaces_both_fields() {
        let mut note = Note::new("Old title", "Old text");
        note.update_note("New title", "New text");
        assert_eq!(note.note_title(), "New title");
        assert_eq!(note.note_text(), "New text");
        assert!(note.check_if_checksum_matches_content());
    }

    #[test]
    fn clone_is_deep_and_checksum_valid() {
        let original = Note::new("Topic", "Text");
        let copy = original.clone();
        assert_eq!(original, copy);
        assert!(copy.check_if_checksum_matches_content());
        // Owned buffers: mutating the copy leaves the original alone.
        let mut copy = copy;
        copy.update_note_title("Changed");
        assert_eq!(original.note_title(), "Topic");
    }

    #[test]
    fn serde_roundtrip_preserves_checksum_exactly() {
        let note = Note::new("Some topic", "Some text");
        let json = serde_json::to_string(&note).unwrap();
        let restored: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(note, restored);
        assert_eq!(note.checksum(), restored.checksum());
        assert!(restored.check_if_checksum_matches_content());
    }

    #[test]
    fn seal_and_reopen_reproduces_the_note() {
        let note = Note::with_time("Topic", "Body", 1_600_000_000);
        let secret = NoteSecret::new(&note, "key-1", fresh_algorithm(), &KEY).unwrap();

        assert_eq!(secret.note_title(&KEY).unwrap(), "Topic");
        assert_eq!(secret.note_text(&KEY).unwrap(), "Body");
        assert_eq!(secret.creation_time(&KEY).unwrap(), 1_600_000_000);
        assert_eq!(secret.to_note(&KEY).unwrap(), note);
        assert_eq!(secret.key_identifier(), "key-1");
        assert!(secret.check_if_checksum_matches_content());
    }

    #[test]
    fn setter_round_trips_and_regenerates_configuration() {
        let note = Note::new("Topic", "Body");
        let mut secret = NoteSecret::new(&note, "key-1", fresh_algorithm(), &KEY).unwrap();
        let settings_before = secret.algorithm().settings().clone();

        assert!(secret.set_note_text("Rewritten body", &KEY));
        assert_eq!(secret.note_text(&KEY).unwrap(), "Rewritten body");
        assert_eq!(secret.note_title(&KEY).unwrap(), "Topic");
        assert_ne!(secret.algorithm().settings(), &settings_before);
    }

    #[test]
    fn wrong_key_fails_closed_everywhere() {
        let note = Note::new("Topic", "Body");
        let mut secret = NoteSecret::new(&note, "key-1", fresh_algorithm(), &KEY).unwrap();
        let wrong = [0xEE; 32];

        assert!(!secret.can_be_decrypted_with(&wrong));
        assert!(secret.note_title(&wrong).is_err());
        let before = secret.clone();
        assert!(!secret.set_note_title("evil", &wrong));
        assert_eq!(secret, before);
    }

    #[test]
    fn custom_map_seal_is_honored() {
        let mut map = EnvelopeMap::new();
        map.insert(
            NOTE_TITLE_KEY.into(),
            EnvelopeValue::Text("from map".into()),
        );
        map.insert(NOTE_TEXT_KEY.into(), EnvelopeValue::Text("body".into()));
        map.insert(CREATION_TIME_KEY.into(), EnvelopeValue::UnixTime(7));
        map.insert(MODIFICATION_TIME_KEY.into(), EnvelopeValue::UnixTime(8));

        let secret = NoteSecret::from_map(&map, "key-1", fresh_algorithm(), &KEY).unwrap();
        assert_eq!(secret.note_title(&KEY).unwrap(), "from map");
        assert_eq!(secret.modification_time(&KEY).unwrap(), 8);
    }

    #[test]
    fn secret_serde_roundtrip_stays_decryptable() {
        let note = Note::new("Topic", "Body");
        let secret = NoteSecret::new(&note, "key-1", fresh_algorithm(), &KEY).unwrap();
        let json = serde_json::to_string(&secret).unwrap();
        let restored: NoteSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(secret, restored);
        assert!(restored.can_be_decrypted_with(&KEY));
        assert_eq!(restored.note_text(&KEY).unwrap(), "Body");
    }
}
