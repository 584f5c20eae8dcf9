//! Boundary validation for upstream records.

pub mod fingerprint;
pub mod wire;

pub use fingerprint::{compute_hash, fingerprint_message};
pub use wire::{RawConversation, RawMessage, validate_snapshot};
