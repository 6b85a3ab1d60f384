//! Typed-map envelope codec boundary.
//!
//! Sealed records flatten a plaintext record into an ordered, string-keyed
//! map of typed values, hand the map to the codec for a self-describing
//! byte envelope, and encrypt that envelope. This module is the boundary:
//! [`serialize_map`] / [`deserialize_map`] delegate the actual encoding to
//! `serde_json`, and the encryption layer treats the result as opaque
//! bytes. [`deserialize_map`] doubles as the well-formedness gate for
//! decrypted data — bytes produced by a wrong key do not parse.
//!
//! Timestamps always travel as [`EnvelopeValue::UnixTime`], never as bare
//! integers, so the codec can tell them apart from other numeric content.

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SecretError;

/// Envelope key for a record's creation timestamp — shared by every
/// record type.
pub const CREATION_TIME_KEY: &str = "creation_time";

/// Envelope key for a record's modification timestamp — shared by every
/// record type.
pub const MODIFICATION_TIME_KEY: &str = "modification_time";

/// A typed value inside the envelope. The tag is part of the encoded
/// form, so every value's kind survives the round trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EnvelopeValue {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes (Base64 in the encoded form).
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Timestamp as Unix seconds.
    UnixTime(i64),
}

impl EnvelopeValue {
    /// Borrow the text payload, if this value is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the byte payload, if this value is bytes.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The timestamp payload, if this value is a Unix timestamp.
    #[must_use]
    pub const fn as_unix_time(&self) -> Option<i64> {
        match self {
            Self::UnixTime(t) => Some(*t),
            _ => None,
        }
    }
}

/// Ordered string-keyed map of typed values — the unit the codec
/// serializes and the encryption layer seals.
pub type EnvelopeMap = BTreeMap<String, EnvelopeValue>;

/// Serialize a map into the self-describing byte envelope.
///
/// # Errors
///
/// Returns [`SecretError::EnvelopeSerialization`] if the codec rejects
/// the map (not expected for well-typed input).
pub fn serialize_map(map: &EnvelopeMap) -> Result<Vec<u8>, SecretError> {
    serde_json::to_vec(map).map_err(|e| SecretError::EnvelopeSerialization(e.to_string()))
}

/// Parse a byte envelope back into a map, validating well-formedness.
///
/// # Errors
///
/// Returns [`SecretError::MalformedEnvelope`] if the bytes do not parse —
/// the signal that a decryption used the wrong key or the ciphertext was
/// tampered with.
pub fn deserialize_map(bytes: &[u8]) -> Result<EnvelopeMap, SecretError> {
    serde_json::from_slice(bytes).map_err(|e| SecretError::MalformedEnvelope(e.to_string()))
}

/// Pull a text field out of an opened map.
pub(crate) fn require_text(map: &EnvelopeMap, field: &str) -> Result<String, SecretError> {
    let value = map
        .get(field)
        .ok_or_else(|| SecretError::FieldNotFound(field.to_owned()))?;
    value
        .as_text()
        .map(ToOwned::to_owned)
        .ok_or_else(|| SecretError::FieldKindMismatch {
            field: field.to_owned(),
            expected: "text",
        })
}

/// Pull a byte field out of an opened map.
pub(crate) fn require_bytes(map: &EnvelopeMap, field: &str) -> Result<Vec<u8>, SecretError> {
    let value = map
        .get(field)
        .ok_or_else(|| SecretError::FieldNotFound(field.to_owned()))?;
    value
        .as_bytes()
        .map(ToOwned::to_owned)
        .ok_or_else(|| SecretError::FieldKindMismatch {
            field: field.to_owned(),
            expected: "bytes",
        })
}

/// Pull a timestamp field out of an opened map.
pub(crate) fn require_time(map: &EnvelopeMap, field: &str) -> Result<i64, SecretError> {
    let value = map
        .get(field)
        .ok_or_else(|| SecretError::FieldNotFound(field.to_owned()))?;
    value
        .as_unix_time()
        .ok_or_else(|| SecretError::FieldKindMismatch {
            field: field.to_owned(),
            expected: "unix_time",
        })
}

pub(crate) mod base64_bytes {
    use super::BASE64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> EnvelopeMap {
        let mut map = EnvelopeMap::new();
        map.insert("title".into(), EnvelopeValue::Text("hello".into()));
        map.insert(
            "payload".into(),
            EnvelopeValue::Bytes(vec![0, 1, 2, 254, 255]),
        );
        map.insert(
            CREATION_TIME_KEY.into(),
            EnvelopeValue::UnixTime(1_600_000_000),
        );
        map
    }

    #[test]
    fn map_roundtrip_preserves_kinds_and_values() {
        let map = sample_map();
        let bytes = serialize_map(&map).unwrap();
        let restored = deserialize_map(&bytes).unwrap();
        assert_eq!(map, restored);
        assert_eq!(restored["title"].as_text(), Some("hello"));
        assert_eq!(
            restored["payload"].as_bytes(),
            Some([0u8, 1, 2, 254, 255].as_slice())
        );
        assert_eq!(
            restored[CREATION_TIME_KEY].as_unix_time(),
            Some(1_600_000_000)
        );
    }

    #[test]
    fn kind_accessors_reject_other_kinds() {
        let value = EnvelopeValue::Text("text".into());
        assert!(value.as_bytes().is_none());
        assert!(value.as_unix_time().is_none());
    }

    #[test]
    fn bytes_encode_as_base64_text() {
        let mut map = EnvelopeMap::new();
        map.insert("blob".into(), EnvelopeValue::Bytes(vec![1, 2, 3]));
        let bytes = serialize_map(&map).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("AQID"));
    }

    #[test]
    fn garbage_bytes_fail_validation() {
        let err = deserialize_map(&[0x8Fu8, 0x00, 0x13, 0x37]).unwrap_err();
        assert!(matches!(err, SecretError::MalformedEnvelope(_)));
    }

    #[test]
    fn truncated_envelope_fails_validation() {
        let bytes = serialize_map(&sample_map()).unwrap();
        let err = deserialize_map(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, SecretError::MalformedEnvelope(_)));
    }

    #[test]
    fn negative_timestamps_are_representable() {
        let mut map = EnvelopeMap::new();
        map.insert("t".into(), EnvelopeValue::UnixTime(-1));
        let restored = deserialize_map(&serialize_map(&map).unwrap()).unwrap();
        assert_eq!(restored["t"].as_unix_time(), Some(-1));
    }
}
