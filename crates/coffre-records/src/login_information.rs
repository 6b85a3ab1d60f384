//! Login credentials — the richest record type, plaintext or sealed.
//!
//! A login carries the credential proper (username, password, MFA seed)
//! plus organisational metadata (category, tags, icon). Everything is
//! content: when sealed, all of it lives inside the encrypted envelope.

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

pub(crate) const TITLE_KEY: &str = "title";
pub(crate) const URL_KEY: &str = "url";
pub(crate) const EMAIL_KEY: &str = "email";
pub(crate) const USERNAME_KEY: &str = "username";
pub(crate) const PASSWORD_KEY: &str = "password";
pub(crate) const NOTES_KEY: &str = "notes";
pub(crate) const MFA_KEY: &str = "mfa";
pub(crate) const ICON_KEY: &str = "icon";
pub(crate) const CATEGORY_KEY: &str = "category";
pub(crate) const TAGS_KEY: &str = "tags";

// ---------------------------------------------------------------------------
// Plaintext form
// ---------------------------------------------------------------------------

/// A plaintext login credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInformation {
    title: String,
    url: String,
    email: String,
    username: String,
    password: String,
    notes: String,
    mfa: String,
    #[serde(with = "crate::envelope::base64_bytes")]
    icon: Vec<u8>,
    category: String,
    tags: String,
    creation_time: i64,
    modification_time: i64,
    checksum: String,
}

/// Content fields for constructing a [`LoginInformation`].
#[derive(Clone, Debug, Default)]
pub struct LoginInformationFields<'a> {
    /// Display title.
    pub title: &'a str,
    /// Site or service URL.
    pub url: &'a str,
    /// Account email.
    pub email: &'a str,
    /// Login name.
    pub username: &'a str,
    /// The password itself.
    pub password: &'a str,
    /// Free-form notes.
    pub notes: &'a str,
    /// MFA/TOTP seed URI, empty when unused.
    pub mfa: &'a str,
    /// Icon image bytes, empty when unused.
    pub icon: &'a [u8],
    /// Single category label.
    pub category: &'a str,
    /// Tag list as entered (separator is the caller's concern).
    pub tags: &'a str,
}

impl LoginInformation {
    /// New login stamped with the current time. Only title, URL, email,
    /// username and password are mandatory in practice — pass empty
    /// strings for the rest.
    #[must_use]
    pub fn new(fields: &LoginInformationFields<'_>) -> Self {
        Self::with_time(fields, now_unix())
    }

    /// New login with an explicit timestamp.
    #[must_use]
    pub fn with_time(fields: &LoginInformationFields<'_>, time: i64) -> Self {
        Self::from_parts(fields, time, time)
    }

    /// Reconstruct with explicit creation and modification times.
    #[must_use]
    pub fn from_parts(
        fields: &LoginInformationFields<'_>,
        creation_time: i64,
        modification_time: i64,
    ) -> Self {
        let mut login = Self {
            title: fields.title.to_owned(),
            url: fields.url.to_owned(),
            email: fields.email.to_owned(),
            username: fields.username.to_owned(),
            password: fields.password.to_owned(),
            notes: fields.notes.to_owned(),
            mfa: fields.mfa.to_owned(),
            icon: fields.icon.to_vec(),
            category: fields.category.to_owned(),
            tags: fields.tags.to_owned(),
            creation_time,
            modification_time,
            checksum: String::new(),
        };
        login.checksum = login.compute_content_checksum();
        login
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Site or service URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Account email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Notes.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// MFA seed URI.
    #[must_use]
    pub fn mfa(&self) -> &str {
        &self.mfa
    }

    /// Icon bytes.
    #[must_use]
    pub fn icon(&self) -> &[u8] {
        &self.icon
    }

    /// Category label.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Tag list.
    #[must_use]
    pub fn tags(&self) -> &str {
        &self.tags
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

    /// Replace the title, re-stamp, refresh the checksum.
    pub fn update_title(&mut self, title: &str) {
        self.title = title.to_owned();
        self.touch();
    }

    /// Replace the URL, re-stamp, refresh the checksum.
    pub fn update_url(&mut self, url: &str) {
        self.url = url.to_owned();
        self.touch();
    }

    /// Replace the email, re-stamp, refresh the checksum.
    pub fn update_email(&mut self, email: &str) {
        self.email = email.to_owned();
        self.touch();
    }

    /// Replace the username, re-stamp, refresh the checksum.
    pub fn update_username(&mut self, username: &str) {
        self.username = username.to_owned();
        self.touch();
    }

    /// Replace the password, re-stamp, refresh the checksum.
    pub fn update_password(&mut self, password: &str) {
        self.password = password.to_owned();
        self.touch();
    }

    /// Replace the notes, re-stamp, refresh the checksum.
    pub fn update_notes(&mut self, notes: &str) {
        self.notes = notes.to_owned();
        self.touch();
    }

    /// Replace the MFA seed, re-stamp, refresh the checksum.
    pub fn update_mfa(&mut self, mfa: &str) {
        self.mfa = mfa.to_owned();
        self.touch();
    }

    /// Replace the icon, re-stamp, refresh the checksum.
    pub fn update_icon(&mut self, icon: &[u8]) {
        self.icon = icon.to_vec();
        self.touch();
    }

    /// Replace the category, re-stamp, refresh the checksum.
    pub fn update_category(&mut self, category: &str) {
        self.category = category.to_owned();
        self.touch();
    }

    /// Replace the tags, re-stamp, refresh the checksum.
    pub fn update_tags(&mut self, tags: &str) {
        self.tags = tags.to_owned();
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
        for (key, value) in [
            (TITLE_KEY, &self.title),
            (URL_KEY, &self.url),
            (EMAIL_KEY, &self.email),
            (USERNAME_KEY, &self.username),
            (PASSWORD_KEY, &self.password),
            (NOTES_KEY, &self.notes),
            (MFA_KEY, &self.mfa),
            (CATEGORY_KEY, &self.category),
            (TAGS_KEY, &self.tags),
        ] {
            map.insert(key.to_owned(), EnvelopeValue::Text(value.clone()));
        }
        map.insert(ICON_KEY.to_owned(), EnvelopeValue::Bytes(self.icon.clone()));
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
            self.title.as_bytes(),
            self.url.as_bytes(),
            self.email.as_bytes(),
            self.username.as_bytes(),
            self.password.as_bytes(),
            self.notes.as_bytes(),
            self.mfa.as_bytes(),
            &self.icon,
            self.category.as_bytes(),
            self.tags.as_bytes(),
            &self.creation_time.to_le_bytes(),
            &self.modification_time.to_le_bytes(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Sealed form
// ---------------------------------------------------------------------------

/// A login credential held as ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoginInformationSecret {
    sealed: SealedEnvelope,
}

impl LoginInformationSecret {
    /// Seal a plaintext login.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::seal`] failures.
    pub fn new(
        login: &LoginInformation,
        key_identifier: &str,
        algorithm: SymmetricKeyAlgorithm,
        derived_key: &[u8],
    ) -> Result<Self, SecretError> {
        Self::from_map(
            &login.to_envelope_map(),
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

    /// Decrypt and return the title.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn title(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(TITLE_KEY, derived_key)
    }

    /// Decrypt and return the URL.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn url(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(URL_KEY, derived_key)
    }

    /// Decrypt and return the email.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn email(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(EMAIL_KEY, derived_key)
    }

    /// Decrypt and return the username.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn username(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(USERNAME_KEY, derived_key)
    }

    /// Decrypt and return the password.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn password(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(PASSWORD_KEY, derived_key)
    }

    /// Decrypt and return the notes.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn notes(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(NOTES_KEY, derived_key)
    }

    /// Decrypt and return the MFA seed.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn mfa(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(MFA_KEY, derived_key)
    }

    /// Decrypt and return the icon bytes.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn icon(&self, derived_key: &[u8]) -> Result<Vec<u8>, SecretError> {
        self.sealed.bytes_field(ICON_KEY, derived_key)
    }

    /// Decrypt and return the category.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn category(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(CATEGORY_KEY, derived_key)
    }

    /// Decrypt and return the tags.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn tags(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(TAGS_KEY, derived_key)
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

    /// Replace the title. `true` on success.
    pub fn set_title(&mut self, title: &str, derived_key: &[u8]) -> bool {
        self.set_text(TITLE_KEY, title, derived_key)
    }

    /// Replace the URL. `true` on success.
    pub fn set_url(&mut self, url: &str, derived_key: &[u8]) -> bool {
        self.set_text(URL_KEY, url, derived_key)
    }

    /// Replace the email. `true` on success.
    pub fn set_email(&mut self, email: &str, derived_key: &[u8]) -> bool {
        self.set_text(EMAIL_KEY, email, derived_key)
    }

    /// Replace the username. `true` on success.
    pub fn set_username(&mut self, username: &str, derived_key: &[u8]) -> bool {
        self.set_text(USERNAME_KEY, username, derived_key)
    }

    /// Replace the password. `true` on success.
    pub fn set_password(&mut self, password: &str, derived_key: &[u8]) -> bool {
        self.set_text(PASSWORD_KEY, password, derived_key)
    }

    /// Replace the notes. `true` on success.
    pub fn set_notes(&mut self, notes: &str, derived_key: &[u8]) -> bool {
        self.set_text(NOTES_KEY, notes, derived_key)
    }

    /// Replace the MFA seed. `true` on success.
    pub fn set_mfa(&mut self, mfa: &str, derived_key: &[u8]) -> bool {
        self.set_text(MFA_KEY, mfa, derived_key)
    }

    /// Replace the icon. `true` on success.
    pub fn set_icon(&mut self, icon: &[u8], derived_key: &[u8]) -> bool {
        self.sealed
            .set_field(ICON_KEY, EnvelopeValue::Bytes(icon.to_vec()), derived_key)
    }

    /// Replace the category. `true` on success.
    pub fn set_category(&mut self, category: &str, derived_key: &[u8]) -> bool {
        self.set_text(CATEGORY_KEY, category, derived_key)
    }

    /// Replace the tags. `true` on success.
    pub fn set_tags(&mut self, tags: &str, derived_key: &[u8]) -> bool {
        self.set_text(TAGS_KEY, tags, derived_key)
    }

    fn set_text(&mut self, field: &str, value: &str, derived_key: &[u8]) -> bool {
        self.sealed
            .set_field(field, EnvelopeValue::Text(value.to_owned()), derived_key)
    }

    /// Non-destructive password probe. Never errors.
    #[must_use]
    pub fn can_be_decrypted_with(&self, derived_key: &[u8]) -> bool {
        self.sealed.can_open_with(derived_key)
    }

    /// Full decrypt back to a plaintext [`LoginInformation`], timestamps
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn to_login_information(
        &self,
        derived_key: &[u8],
    ) -> Result<LoginInformation, SecretError> {
        let map = self.sealed.open(derived_key)?;
        let title = require_text(&map, TITLE_KEY)?;
        let url = require_text(&map, URL_KEY)?;
        let email = require_text(&map, EMAIL_KEY)?;
        let username = require_text(&map, USERNAME_KEY)?;
        let password = require_text(&map, PASSWORD_KEY)?;
        let notes = require_text(&map, NOTES_KEY)?;
        let mfa = require_text(&map, MFA_KEY)?;
        let icon = require_bytes(&map, ICON_KEY)?;
        let category = require_text(&map, CATEGORY_KEY)?;
        let tags = require_text(&map, TAGS_KEY)?;
        Ok(LoginInformation::from_parts(
            &LoginInformationFields {
                title: &title,
                url: &url,
                email: &email,
                username: &username,
                password: &password,
                notes: &notes,
                mfa: &mfa,
                icon: &icon,
                category: &category,
                tags: &tags,
            },
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
