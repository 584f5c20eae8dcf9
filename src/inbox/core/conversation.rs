//! Conversation model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inbox::core::ids::ConversationId;
use crate::inbox::core::message::{Message, MessageTime};

/// A thread of messages between one customer and one or more agents.
///
/// `messages` is kept sorted ascending by `created_at`; the last element is
/// the latest message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier.
    pub id: ConversationId,
    /// Display label for the customer.
    pub customer: String,
    /// When the conversation was opened upstream, if known.
    pub created_at: Option<DateTime<Utc>>,
    /// Messages in ascending creation order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new(id: ConversationId, customer: impl Into<String>) -> Self {
        Self {
            id,
            customer: customer.into(),
            created_at: None,
            messages: Vec::new(),
        }
    }

    /// Latest message, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Creation time of the latest message, `None` when the thread is empty.
    ///
    /// `None` orders before every `Some`, so empty threads rank as oldest.
    #[must_use]
    pub fn latest_activity(&self) -> Option<MessageTime> {
        self.latest().map(|message| message.created_at)
    }

    /// Latest parseable message time, skipping `Unknown` timestamps.
    #[must_use]
    pub fn latest_known_activity(&self) -> Option<DateTime<Utc>> {
        self.messages
            .iter()
            .rev()
            .find_map(|message| message.created_at.instant())
    }

    /// Body of the latest message, or `placeholder` for an empty thread.
    #[must_use]
    pub fn preview<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self.latest() {
            Some(message) if !message.body.is_empty() => &message.body,
            _ => placeholder,
        }
    }

    /// Stable sort of the thread by creation time.
    pub fn sort_messages(&mut self) {
        self.messages.sort_by_key(|message| message.created_at);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::inbox::core::ids::CustomerId;

    #[test]
    fn test_empty_conversation_has_no_activity() {
        let conversation = Conversation::new(ConversationId::new(), "Anonymous User");
        assert_eq!(conversation.latest_activity(), None);
        assert_eq!(conversation.latest_known_activity(), None);
        assert_eq!(conversation.preview("..."), "...");
    }

    #[test]
    fn test_preview_uses_latest_body() {
        let id = ConversationId::new();
        let customer = CustomerId::new();
        let mut conversation = Conversation::new(id, "Anonymous User");
        conversation.messages.push(Message::customer(
            id,
            customer,
            "first",
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        ));
        conversation.messages.push(Message::agent(
            id,
            "second",
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 1, 0).unwrap(),
        ));
        assert_eq!(conversation.preview("..."), "second");
    }

    #[test]
    fn test_sort_messages_is_stable() {
        let id = ConversationId::new();
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut conversation = Conversation::new(id, "Anonymous User");
        conversation.messages = vec![
            Message::agent(id, "late", Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap()),
            Message::agent(id, "tie-a", at),
            Message::agent(id, "tie-b", at),
        ];
        conversation.sort_messages();
        let bodies: Vec<&str> = conversation.messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["tie-a", "tie-b", "late"]);
    }

    #[test]
    fn test_latest_known_activity_skips_unknown() {
        let id = ConversationId::new();
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut conversation = Conversation::new(id, "Anonymous User");
        conversation.messages = vec![
            Message::agent(id, "ok", at),
            Message::agent(id, "broken", MessageTime::Unknown),
        ];
        assert_eq!(conversation.latest_activity(), Some(MessageTime::Unknown));
        assert_eq!(conversation.latest_known_activity(), Some(at));
    }
}
