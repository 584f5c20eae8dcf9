//! Snapshot indexing: conversation-by-id with time-ordered threads.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

use crate::inbox::core::conversation::Conversation;
use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::core::ids::ConversationId;

/// Conversations keyed by id.
///
/// Also remembers the order in which conversations were first seen, which the
/// ranker uses to break ties deterministically.
#[derive(Clone, Debug, Default)]
pub struct ConversationIndex {
    conversations: HashMap<ConversationId, Conversation>,
    arrival: Vec<ConversationId>,
}

impl ConversationIndex {
    /// Look up a conversation.
    #[must_use]
    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.conversations.get_mut(id)
    }

    /// Whether the conversation is indexed.
    #[must_use]
    pub fn contains(&self, id: &ConversationId) -> bool {
        self.conversations.contains_key(id)
    }

    /// Number of indexed conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Ids in arrival order.
    #[must_use]
    pub fn arrival_order(&self) -> &[ConversationId] {
        &self.arrival
    }

    /// Insert a conversation that is not yet indexed.
    ///
    /// # Errors
    /// Returns `DuplicateConversation` if the id is already present.
    pub(crate) fn insert(&mut self, conversation: Conversation) -> InboxResult<()> {
        match self.conversations.entry(conversation.id) {
            Entry::Occupied(_) => Err(InboxError::DuplicateConversation(conversation.id)),
            Entry::Vacant(slot) => {
                self.arrival.push(conversation.id);
                slot.insert(conversation);
                Ok(())
            }
        }
    }
}

/// Build the index from a snapshot.
///
/// Each thread is stable-sorted by `created_at`, so messages sharing a
/// timestamp keep their input order. Embedded messages always belong to their
/// container; a disagreeing `conversation_id` is rewritten.
///
/// # Errors
/// Returns `EmptySnapshot` for an empty input and `DuplicateConversation` when
/// an id appears twice.
pub fn index_conversations(conversations: Vec<Conversation>) -> InboxResult<ConversationIndex> {
    if conversations.is_empty() {
        return Err(InboxError::EmptySnapshot);
    }

    let mut index = ConversationIndex::default();
    for mut conversation in conversations {
        let container = conversation.id;
        for message in &mut conversation.messages {
            if message.conversation_id != container {
                warn!(
                    %container,
                    referenced = %message.conversation_id,
                    "Embedded message references another conversation"
                );
                message.conversation_id = container;
            }
        }
        conversation.sort_messages();
        index.insert(conversation)?;
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::inbox::core::message::{Message, MessageTime};

    fn at(minute: u32) -> MessageTime {
        MessageTime::At(Utc.with_ymd_and_hms(2020, 1, 1, 0, minute, 0).unwrap())
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(matches!(
            index_conversations(Vec::new()),
            Err(InboxError::EmptySnapshot)
        ));
    }

    #[test]
    fn test_duplicate_conversation_rejected() {
        let id = ConversationId::new();
        let result = index_conversations(vec![
            Conversation::new(id, "a"),
            Conversation::new(id, "b"),
        ]);
        assert!(matches!(result, Err(InboxError::DuplicateConversation(dup)) if dup == id));
    }

    #[test]
    fn test_threads_sorted_ascending() {
        let id = ConversationId::new();
        let mut conversation = Conversation::new(id, "a");
        conversation.messages = vec![
            Message::agent(id, "third", at(30)),
            Message::agent(id, "broken", MessageTime::Unknown),
            Message::agent(id, "first", at(10)),
            Message::agent(id, "second", at(20)),
        ];

        let index = index_conversations(vec![conversation]).unwrap();
        let thread = &index.get(&id).unwrap().messages;
        assert!(thread.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        let bodies: Vec<&str> = thread.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third", "broken"]);
    }

    #[test]
    fn test_identical_timestamps_keep_input_order() {
        let id = ConversationId::new();
        let mut conversation = Conversation::new(id, "a");
        conversation.messages = vec![
            Message::agent(id, "one", at(5)),
            Message::agent(id, "two", at(5)),
            Message::agent(id, "zero", at(1)),
        ];

        let index = index_conversations(vec![conversation]).unwrap();
        let bodies: Vec<&str> = index
            .get(&id)
            .unwrap()
            .messages
            .iter()
            .map(|m| m.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["zero", "one", "two"]);
    }

    #[test]
    fn test_misfiled_message_rewritten_to_container() {
        let id = ConversationId::new();
        let mut conversation = Conversation::new(id, "a");
        conversation
            .messages
            .push(Message::agent(ConversationId::new(), "stray", at(1)));

        let index = index_conversations(vec![conversation]).unwrap();
        assert_eq!(index.get(&id).unwrap().messages[0].conversation_id, id);
    }

    #[test]
    fn test_arrival_order_preserved() {
        let ids: Vec<ConversationId> = (0..4).map(|_| ConversationId::new()).collect();
        let index = index_conversations(
            ids.iter().map(|id| Conversation::new(*id, "c")).collect(),
        )
        .unwrap();
        assert_eq!(index.arrival_order(), ids.as_slice());
        assert_eq!(index.len(), 4);
    }
}
