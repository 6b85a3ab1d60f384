//! Content checksums for tamper and corruption detection.
//!
//! Every record type fingerprints its fields with [`compute_checksum`]:
//! SHA-256 over an ordered list of byte buffers, rendered as 64 lowercase
//! hex characters. Checksums are persisted alongside the record and
//! compared later, so the computation must be byte-stable across runs
//! and platforms — no randomness, no machine-dependent state.

use data_encoding::HEXLOWER;
use sha2::{Digest, Sha256};

/// Length of a rendered checksum in hex characters (256-bit digest).
pub const CHECKSUM_HEX_LEN: usize = 64;

/// Compute the SHA-256 checksum of `buffers` concatenated in order.
///
/// Order-sensitive: swapping two buffers with distinct content changes
/// the result. The digest runs over the concatenation, so buffer
/// boundaries themselves do not contribute.
#[must_use]
pub fn compute_checksum(buffers: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for buffer in buffers {
        hasher.update(buffer);
    }
    HEXLOWER.encode(hasher.finalize().as_slice())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
