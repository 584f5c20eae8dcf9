//! Content fingerprints for messages delivered without an upstream id.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::inbox::core::ids::ConversationId;
use crate::inbox::core::message::Sender;

/// Compute a stable hash for a string.
#[must_use]
pub fn compute_hash(value: &str) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    let digest = hasher.finish();
    format!("{digest:016x}")
}

/// Fingerprint of a message's identifying fields.
///
/// `created_at` is the normalized instant when it parsed and the upstream text
/// otherwise. Leading and trailing whitespace of the body is ignored;
/// everything else is compared verbatim.
#[must_use]
pub fn fingerprint_message(
    conversation_id: ConversationId,
    sender: Sender,
    body: &str,
    created_at: &str,
) -> String {
    compute_hash(&format!(
        "{conversation_id}\u{1f}{sender}\u{1f}{created_at}\u{1f}{}",
        body.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash_is_hex() {
        let hash = compute_hash("hello");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_ignores_surrounding_whitespace() {
        let id = ConversationId::new();
        let a = fingerprint_message(id, Sender::Agent, "hi", "unknown");
        let b = fingerprint_message(id, Sender::Agent, "  hi\n", "unknown");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_depends_on_sender_and_conversation() {
        let id = ConversationId::new();
        let agent = fingerprint_message(id, Sender::Agent, "hi", "unknown");
        let customer = fingerprint_message(id, Sender::Customer, "hi", "unknown");
        let other = fingerprint_message(ConversationId::new(), Sender::Agent, "hi", "unknown");
        assert_ne!(agent, customer);
        assert_ne!(agent, other);
    }

    #[test]
    fn test_fingerprint_depends_on_timestamp_text() {
        let id = ConversationId::new();
        let first = fingerprint_message(id, Sender::Agent, "ok", "garbage-1");
        let second = fingerprint_message(id, Sender::Agent, "ok", "garbage-2");
        assert_ne!(first, second);
    }
}
