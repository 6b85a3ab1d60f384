#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for PBKDF2 key-derivation entries.

use coffre_crypto_core::kdf::{KeyDerivationFunctionEntry, PseudorandomFunction, MIN_ITERATIONS};
use proptest::prelude::*;

proptest! {
    /// Derivation is a pure function of (password, stored parameters).
    #[test]
    fn derivation_is_deterministic(
        password in proptest::collection::vec(any::<u8>(), 0..64),
        salt in proptest::collection::vec(any::<u8>(), 16..48),
    ) {
        let entry = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            salt,
            MIN_ITERATIONS,
            32,
            "prop",
        ).unwrap();
        let a = entry.derive_key_bytes(&password);
        let b = entry.derive_key_bytes(&password);
        prop_assert_eq!(a.as_slice(), b.as_slice());
        prop_assert_eq!(a.len(), 32);
    }

    /// Distinct passwords yield distinct keys under the same entry.
    #[test]
    fn distinct_passwords_distinct_keys(
        password in proptest::collection::vec(any::<u8>(), 1..64),
        flip in 0u8..8,
    ) {
        let entry = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha512,
            b"a fixed 16B salt".to_vec(),
            MIN_ITERATIONS,
            32,
            "prop",
        ).unwrap();
        let mut other = password.clone();
        other[0] ^= 1u8 << flip;
        prop_assume!(other != password);
        let key_password = entry.derive_key_bytes(&password);
        let key_other = entry.derive_key_bytes(&other);
        prop_assert_ne!(
            key_password.as_slice(),
            key_other.as_slice()
        );
    }

    /// The checksum survives serde persistence for any valid salt.
    #[test]
    fn checksum_survives_persistence(
        salt in proptest::collection::vec(any::<u8>(), 16..64),
        iterations in MIN_ITERATIONS..MIN_ITERATIONS * 4,
    ) {
        let entry = KeyDerivationFunctionEntry::new(
            PseudorandomFunction::HmacSha256,
            salt,
            iterations,
            32,
            "prop",
        ).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let restored: KeyDerivationFunctionEntry = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(entry.checksum(), restored.checksum());
        prop_assert!(restored.check_if_checksum_matches_content());
    }
}
