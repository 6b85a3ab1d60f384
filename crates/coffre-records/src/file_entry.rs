//! File entries — a filename plus raw content bytes, plaintext or sealed.

use coffre_crypto_core::checksum::compute_checksum;
use coffre_crypto_core::symmetric::SymmetricKeyAlgorithm;
use serde::{Deserialize, Serialize};

use crate::clock::now_unix;
use crate::envelope::{
    require_bytes, require_text, require_time, EnvelopeMap, EnvelopeValue, CREATION_TIME_KEY,
    MODIFICATION_TIME_KEY,
};
use crate::error::SecretError;
use crate::sealed::SealedEnvelope;

pub(crate) const FILENAME_KEY: &str = "filename";
pub(crate) const FILE_CONTENT_KEY: &str = "file_content";

// ---------------------------------------------------------------------------
// Plaintext form
// ---------------------------------------------------------------------------

/// A plaintext file entry. Content is an owned byte buffer; `Clone`
/// duplicates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    filename: String,
    #[serde(with = "crate::envelope::base64_bytes")]
    file_content: Vec<u8>,
    creation_time: i64,
    modification_time: i64,
    checksum: String,
}

impl FileEntry {
    /// New file entry stamped with the current time.
    #[must_use]
    pub fn new(filename: &str, file_content: &[u8]) -> Self {
        Self::with_time(filename, file_content, now_unix())
    }

    /// New file entry with an explicit timestamp.
    #[must_use]
    pub fn with_time(filename: &str, file_content: &[u8], time: i64) -> Self {
        Self::from_parts(filename, file_content, time, time)
    }

    /// Reconstruct with explicit creation and modification times.
    #[must_use]
    pub fn from_parts(
        filename: &str,
        file_content: &[u8],
        creation_time: i64,
        modification_time: i64,
    ) -> Self {
        let mut entry = Self {
            filename: filename.to_owned(),
            file_content: file_content.to_vec(),
            creation_time,
            modification_time,
            checksum: String::new(),
        };
        entry.checksum = entry.compute_content_checksum();
        entry
    }

    /// Filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// File content bytes.
    #[must_use]
    pub fn file_content(&self) -> &[u8] {
        &self.file_content
    }

    /// Content length in bytes.
    #[must_use]
    pub fn file_content_length_in_bytes(&self) -> usize {
        self.file_content.len()
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

    /// Replace the filename, re-stamp, refresh the checksum.
    pub fn update_filename(&mut self, filename: &str) {
        self.filename = filename.to_owned();
        self.touch();
    }

    /// Replace the content, re-stamp, refresh the checksum.
    pub fn update_file_content(&mut self, file_content: &[u8]) {
        self.file_content = file_content.to_vec();
        self.touch();
    }

    /// Replace filename and content together with a single re-stamp.
    pub fn update_file_entry(&mut self, filename: &str, file_content: &[u8]) {
        self.filename = filename.to_owned();
        self.file_content = file_content.to_vec();
        self.touch();
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
            FILENAME_KEY.to_owned(),
            EnvelopeValue::Text(self.filename.clone()),
        );
        map.insert(
            FILE_CONTENT_KEY.to_owned(),
            EnvelopeValue::Bytes(self.file_content.clone()),
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
            self.filename.as_bytes(),
            &self.file_content,
            &self.creation_time.to_le_bytes(),
            &self.modification_time.to_le_bytes(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Sealed form
// ---------------------------------------------------------------------------

/// A file entry held as ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileEntrySecret {
    sealed: SealedEnvelope,
}

impl FileEntrySecret {
    /// Seal a plaintext file entry.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::seal`] failures.
    pub fn new(
        entry: &FileEntry,
        key_identifier: &str,
        algorithm: SymmetricKeyAlgorithm,
        derived_key: &[u8],
    ) -> Result<Self, SecretError> {
        Self::from_map(
            &entry.to_envelope_map(),
            key_identifier,
            algorithm,
            derived_key,
        )
    }

    /// Seal a caller-assembled map (escape hatch; caller owns key
    /// completeness).
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

    /// Decrypt and return the filename.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn filename(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(FILENAME_KEY, derived_key)
    }

    /// Decrypt and return the content bytes.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn file_content(&self, derived_key: &[u8]) -> Result<Vec<u8>, SecretError> {
        self.sealed.bytes_field(FILE_CONTENT_KEY, derived_key)
    }

    /// Decrypt and return the content length in bytes.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn file_content_length_in_bytes(&self, derived_key: &[u8]) -> Result<usize, SecretError> {
        Ok(self.file_content(derived_key)?.len())
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

    /// Replace the filename. `true` on success.
    pub fn set_filename(&mut self, filename: &str, derived_key: &[u8]) -> bool {
        self.sealed.set_field(
            FILENAME_KEY,
            EnvelopeValue::Text(filename.to_owned()),
            derived_key,
        )
    }

    /// Replace the content. `true` on success.
    pub fn set_file_content(&mut self, file_content: &[u8], derived_key: &[u8]) -> bool {
        self.sealed.set_field(
            FILE_CONTENT_KEY,
            EnvelopeValue::Bytes(file_content.to_vec()),
            derived_key,
        )
    }

    /// Non-destructive password probe. Never errors.
    #[must_use]
    pub fn can_be_decrypted_with(&self, derived_key: &[u8]) -> bool {
        self.sealed.can_open_with(derived_key)
    }

    /// Full decrypt back to a plaintext [`FileEntry`], timestamps copied
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn to_file_entry(&self, derived_key: &[u8]) -> Result<FileEntry, SecretError> {
        let map = self.sealed.open(derived_key)?;
        Ok(FileEntry::from_parts(
            &require_text(&map, FILENAME_KEY)?,
            &require_bytes(&map, FILE_CONTENT_KEY)?,
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

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
