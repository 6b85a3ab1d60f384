//! Payment cards — card details as text fields, plaintext or sealed.

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

pub(crate) const TITLE_KEY: &str = "title";
pub(crate) const NAME_ON_CARD_KEY: &str = "name_on_card";
pub(crate) const CARD_TYPE_KEY: &str = "card_type";
pub(crate) const NUMBER_KEY: &str = "number";
pub(crate) const SECURITY_CODE_KEY: &str = "security_code";
pub(crate) const START_DATE_KEY: &str = "start_date";
pub(crate) const EXPIRATION_DATE_KEY: &str = "expiration_date";
pub(crate) const NOTES_KEY: &str = "notes";

// ---------------------------------------------------------------------------
// Plaintext form
// ---------------------------------------------------------------------------

/// A plaintext payment card. All content fields are free-form text —
/// number, dates, and codes are stored exactly as entered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCard {
    title: String,
    name_on_card: String,
    card_type: String,
    number: String,
    security_code: String,
    start_date: String,
    expiration_date: String,
    notes: String,
    creation_time: i64,
    modification_time: i64,
    checksum: String,
}

/// Content fields for constructing a [`PaymentCard`], so constructors
/// stay readable at the call site.
#[derive(Clone, Debug, Default)]
pub struct PaymentCardFields<'a> {
    /// Display title.
    pub title: &'a str,
    /// Cardholder name as printed.
    pub name_on_card: &'a str,
    /// Card scheme or product name.
    pub card_type: &'a str,
    /// Card number as entered.
    pub number: &'a str,
    /// CVV/CVC.
    pub security_code: &'a str,
    /// Validity start, free-form.
    pub start_date: &'a str,
    /// Expiration, free-form.
    pub expiration_date: &'a str,
    /// Free-form notes.
    pub notes: &'a str,
}

impl PaymentCard {
    /// New card stamped with the current time.
    #[must_use]
    pub fn new(fields: &PaymentCardFields<'_>) -> Self {
        Self::with_time(fields, now_unix())
    }

    /// New card with an explicit timestamp.
    #[must_use]
    pub fn with_time(fields: &PaymentCardFields<'_>, time: i64) -> Self {
        Self::from_parts(fields, time, time)
    }

    /// Reconstruct with explicit creation and modification times.
    #[must_use]
    pub fn from_parts(
        fields: &PaymentCardFields<'_>,
        creation_time: i64,
        modification_time: i64,
    ) -> Self {
        let mut card = Self {
            title: fields.title.to_owned(),
            name_on_card: fields.name_on_card.to_owned(),
            card_type: fields.card_type.to_owned(),
            number: fields.number.to_owned(),
            security_code: fields.security_code.to_owned(),
            start_date: fields.start_date.to_owned(),
            expiration_date: fields.expiration_date.to_owned(),
            notes: fields.notes.to_owned(),
            creation_time,
            modification_time,
            checksum: String::new(),
        };
        card.checksum = card.compute_content_checksum();
        card
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Cardholder name.
    #[must_use]
    pub fn name_on_card(&self) -> &str {
        &self.name_on_card
    }

    /// Card scheme or product name.
    #[must_use]
    pub fn card_type(&self) -> &str {
        &self.card_type
    }

    /// Card number.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// CVV/CVC.
    #[must_use]
    pub fn security_code(&self) -> &str {
        &self.security_code
    }

    /// Validity start.
    #[must_use]
    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    /// Expiration.
    #[must_use]
    pub fn expiration_date(&self) -> &str {
        &self.expiration_date
    }

    /// Notes.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
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

    /// Replace the cardholder name, re-stamp, refresh the checksum.
    pub fn update_name_on_card(&mut self, name_on_card: &str) {
        self.name_on_card = name_on_card.to_owned();
        self.touch();
    }

    /// Replace the card type, re-stamp, refresh the checksum.
    pub fn update_card_type(&mut self, card_type: &str) {
        self.card_type = card_type.to_owned();
        self.touch();
    }

    /// Replace the number, re-stamp, refresh the checksum.
    pub fn update_number(&mut self, number: &str) {
        self.number = number.to_owned();
        self.touch();
    }

    /// Replace the security code, re-stamp, refresh the checksum.
    pub fn update_security_code(&mut self, security_code: &str) {
        self.security_code = security_code.to_owned();
        self.touch();
    }

    /// Replace the start date, re-stamp, refresh the checksum.
    pub fn update_start_date(&mut self, start_date: &str) {
        self.start_date = start_date.to_owned();
        self.touch();
    }

    /// Replace the expiration date, re-stamp, refresh the checksum.
    pub fn update_expiration_date(&mut self, expiration_date: &str) {
        self.expiration_date = expiration_date.to_owned();
        self.touch();
    }

    /// Replace the notes, re-stamp, refresh the checksum.
    pub fn update_notes(&mut self, notes: &str) {
        self.notes = notes.to_owned();
        self.touch();
    }

    /// Replace every content field with a single re-stamp.
    pub fn update_payment_card(&mut self, fields: &PaymentCardFields<'_>) {
        self.title = fields.title.to_owned();
        self.name_on_card = fields.name_on_card.to_owned();
        self.card_type = fields.card_type.to_owned();
        self.number = fields.number.to_owned();
        self.security_code = fields.security_code.to_owned();
        self.start_date = fields.start_date.to_owned();
        self.expiration_date = fields.expiration_date.to_owned();
        self.notes = fields.notes.to_owned();
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
            (NAME_ON_CARD_KEY, &self.name_on_card),
            (CARD_TYPE_KEY, &self.card_type),
            (NUMBER_KEY, &self.number),
            (SECURITY_CODE_KEY, &self.security_code),
            (START_DATE_KEY, &self.start_date),
            (EXPIRATION_DATE_KEY, &self.expiration_date),
            (NOTES_KEY, &self.notes),
        ] {
            map.insert(key.to_owned(), EnvelopeValue::Text(value.clone()));
        }
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
            self.name_on_card.as_bytes(),
            self.card_type.as_bytes(),
            self.number.as_bytes(),
            self.security_code.as_bytes(),
            self.start_date.as_bytes(),
            self.expiration_date.as_bytes(),
            self.notes.as_bytes(),
            &self.creation_time.to_le_bytes(),
            &self.modification_time.to_le_bytes(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Sealed form
// ---------------------------------------------------------------------------

/// A payment card held as ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentCardSecret {
    sealed: SealedEnvelope,
}

impl PaymentCardSecret {
    /// Seal a plaintext payment card.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::seal`] failures.
    pub fn new(
        card: &PaymentCard,
        key_identifier: &str,
        algorithm: SymmetricKeyAlgorithm,
        derived_key: &[u8],
    ) -> Result<Self, SecretError> {
        Self::from_map(
            &card.to_envelope_map(),
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

    /// Decrypt and return the title.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn title(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(TITLE_KEY, derived_key)
    }

    /// Decrypt and return the cardholder name.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn name_on_card(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(NAME_ON_CARD_KEY, derived_key)
    }

    /// Decrypt and return the card type.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn card_type(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(CARD_TYPE_KEY, derived_key)
    }

    /// Decrypt and return the card number.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn number(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(NUMBER_KEY, derived_key)
    }

    /// Decrypt and return the security code.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn security_code(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(SECURITY_CODE_KEY, derived_key)
    }

    /// Decrypt and return the start date.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn start_date(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(START_DATE_KEY, derived_key)
    }

    /// Decrypt and return the expiration date.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn expiration_date(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(EXPIRATION_DATE_KEY, derived_key)
    }

    /// Decrypt and return the notes.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn notes(&self, derived_key: &[u8]) -> Result<String, SecretError> {
        self.sealed.text_field(NOTES_KEY, derived_key)
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

    /// Replace the cardholder name. `true` on success.
    pub fn set_name_on_card(&mut self, name_on_card: &str, derived_key: &[u8]) -> bool {
        self.set_text(NAME_ON_CARD_KEY, name_on_card, derived_key)
    }

    /// Replace the card type. `true` on success.
    pub fn set_card_type(&mut self, card_type: &str, derived_key: &[u8]) -> bool {
        self.set_text(CARD_TYPE_KEY, card_type, derived_key)
    }

    /// Replace the number. `true` on success.
    pub fn set_number(&mut self, number: &str, derived_key: &[u8]) -> bool {
        self.set_text(NUMBER_KEY, number, derived_key)
    }

    /// Replace the security code. `true` on success.
    pub fn set_security_code(&mut self, security_code: &str, derived_key: &[u8]) -> bool {
        self.set_text(SECURITY_CODE_KEY, security_code, derived_key)
    }

    /// Replace the start date. `true` on success.
    pub fn set_start_date(&mut self, start_date: &str, derived_key: &[u8]) -> bool {
        self.set_text(START_DATE_KEY, start_date, derived_key)
    }

    /// Replace the expiration date. `true` on success.
    pub fn set_expiration_date(&mut self, expiration_date: &str, derived_key: &[u8]) -> bool {
        self.set_text(EXPIRATION_DATE_KEY, expiration_date, derived_key)
    }

    /// Replace the notes. `true` on success.
    pub fn set_notes(&mut self, notes: &str, derived_key: &[u8]) -> bool {
        self.set_text(NOTES_KEY, notes, derived_key)
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

    /// Full decrypt back to a plaintext [`PaymentCard`], timestamps
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Propagates [`SealedEnvelope::open`] and field-lookup failures.
    pub fn to_payment_card(&self, derived_key: &[u8]) -> Result<PaymentCard, SecretError> {
        let map = self.sealed.open(derived_key)?;
        let title = require_text(&map, TITLE_KEY)?;
        let name_on_card = require_text(&map, NAME_ON_CARD_KEY)?;
        let card_type = require_text(&map, CARD_TYPE_KEY)?;
        let number = require_text(&map, NUMBER_KEY)?;
        let security_code = require_text(&map, SECURITY_CODE_KEY)?;
        let start_date = require_text(&map, START_DATE_KEY)?;
        let expiration_date = require_text(&map, EXPIRATION_DATE_KEY)?;
        let notes = require_text(&map, NOTES_KEY)?;
        Ok(PaymentCard::from_parts(
            &PaymentCardFields {
                title: &title,
                name_on_card: &name_on_card,
                card_type: &card_type,
                number: &number,
                security_code: &security_code,
                start_date: &start_date,
                expiration_date: &expiration_date,
                notes: &notes,
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
