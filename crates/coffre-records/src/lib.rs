//! `coffre-records` — Record types for COFFRE.
//!
//! Every record kind exists in two forms: a plaintext struct whose
//! mutations keep a content checksum coherent, and a `*Secret` wrapper
//! that stores the record as an encrypted typed-map envelope and
//! decrypts fields on demand. The sealed machinery is shared through
//! [`sealed::SealedEnvelope`]; per-type modules contribute only field
//! names and typed accessors.
//!
//! Concurrency contract: records have no interior locking. A record
//! instance is mutated by its holder only — concurrent setters on the
//! same instance from multiple threads are a caller bug, not something
//! this crate defends against.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

mod clock;

pub mod envelope;
pub mod error;
pub mod sealed;

pub mod file_entry;
pub mod history;
pub mod login_information;
pub mod note;
pub mod payment_card;

pub use envelope::{
    deserialize_map, serialize_map, EnvelopeMap, EnvelopeValue, CREATION_TIME_KEY,
    MODIFICATION_TIME_KEY,
};
pub use error::SecretError;
pub use file_entry::{FileEntry, FileEntrySecret};
pub use history::{History, HistorySecret};
pub use login_information::{LoginInformation, LoginInformationFields, LoginInformationSecret};
pub use note::{Note, NoteSecret};
pub use payment_card::{PaymentCard, PaymentCardFields, PaymentCardSecret};
pub use sealed::SealedEnvelope;
