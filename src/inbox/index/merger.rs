//! Merging streamed messages into indexed state.

use serde::Serialize;
use tracing::debug;

use crate::inbox::core::config::UnknownConversationPolicy;
use crate::inbox::core::conversation::Conversation;
use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::core::ids::ConversationId;
use crate::inbox::core::message::Message;
use crate::inbox::index::indexer::ConversationIndex;
use crate::inbox::index::ranker::RankOrder;

/// What a merge did.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Message appended to an existing conversation.
    Appended {
        /// Conversation that received the message.
        conversation_id: ConversationId,
        /// The message arrived out of order and the thread was re-sorted.
        reordered: bool,
        /// Rank position of the conversation after the merge.
        rank: usize,
    },
    /// A new conversation was opened for the message.
    Created {
        /// The new conversation.
        conversation_id: ConversationId,
        /// Rank position of the new conversation.
        rank: usize,
    },
    /// The message was already present; nothing changed.
    Duplicate {
        /// Conversation holding the earlier copy.
        conversation_id: ConversationId,
    },
}

impl MergeOutcome {
    /// Conversation the merge concerned.
    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        match self {
            Self::Appended {
                conversation_id, ..
            }
            | Self::Created {
                conversation_id, ..
            }
            | Self::Duplicate { conversation_id } => *conversation_id,
        }
    }

    /// Whether state changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::Duplicate { .. })
    }
}

/// Merge one incoming message.
///
/// The receiving conversation moves to the front of `rank`; every other id
/// keeps its relative order. Nothing is mutated unless the merge succeeds and
/// the message is new.
///
/// # Errors
/// Returns `UnknownConversation` when the message's conversation is not
/// indexed and `policy` is [`UnknownConversationPolicy::Reject`].
pub fn merge_message(
    index: &mut ConversationIndex,
    rank: &mut RankOrder,
    message: Message,
    policy: UnknownConversationPolicy,
    default_customer: &str,
) -> InboxResult<MergeOutcome> {
    let conversation_id = message.conversation_id;

    let Some(conversation) = index.get_mut(&conversation_id) else {
        return match policy {
            UnknownConversationPolicy::Reject => {
                Err(InboxError::UnknownConversation(conversation_id))
            }
            UnknownConversationPolicy::Create => {
                let mut conversation = Conversation::new(conversation_id, default_customer);
                conversation.messages.push(message);
                index.insert(conversation)?;
                rank.move_to_front(conversation_id);
                debug!(%conversation_id, "Opened conversation from stream");
                Ok(MergeOutcome::Created {
                    conversation_id,
                    rank: 0,
                })
            }
        };
    };

    let key = message.key();
    if conversation.messages.iter().any(|existing| existing.key() == key) {
        debug!(%conversation_id, "Ignoring duplicate delivery");
        return Ok(MergeOutcome::Duplicate { conversation_id });
    }

    let reordered = conversation
        .latest()
        .is_some_and(|last| message.created_at < last.created_at);
    conversation.messages.push(message);
    if reordered {
        conversation.sort_messages();
    }

    rank.move_to_front(conversation_id);
    debug!(%conversation_id, reordered, "Merged message");

    Ok(MergeOutcome::Appended {
        conversation_id,
        reordered,
        rank: 0,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::inbox::core::ids::{CustomerId, MessageId};
    use crate::inbox::core::message::MessageTime;
    use crate::inbox::index::indexer::index_conversations;
    use crate::inbox::index::ranker::rank_conversations;
    use crate::inbox::ingest::wire::RawMessage;

    fn at(minute: u32) -> MessageTime {
        MessageTime::At(Utc.with_ymd_and_hms(2020, 1, 1, 0, minute, 0).unwrap())
    }

    fn seeded(times: &[u32]) -> (ConversationIndex, RankOrder, Vec<ConversationId>) {
        let conversations: Vec<Conversation> = times
            .iter()
            .map(|minute| {
                let id = ConversationId::new();
                let mut conversation = Conversation::new(id, "c");
                conversation
                    .messages
                    .push(Message::agent(id, "seed", at(*minute)));
                conversation
            })
            .collect();
        let ids = conversations.iter().map(|c| c.id).collect();
        let index = index_conversations(conversations).unwrap();
        let rank = rank_conversations(&index);
        (index, rank, ids)
    }

    fn merge(
        index: &mut ConversationIndex,
        rank: &mut RankOrder,
        message: Message,
    ) -> InboxResult<MergeOutcome> {
        merge_message(
            index,
            rank,
            message,
            UnknownConversationPolicy::Reject,
            "Anonymous User",
        )
    }

    #[test]
    fn test_merge_moves_conversation_to_front() {
        let (mut index, mut rank, ids) = seeded(&[10, 20]);
        let (a, b) = (ids[0], ids[1]);
        assert_eq!(rank.as_slice(), &[b, a]);

        let outcome = merge(&mut index, &mut rank, Message::agent(a, "reply", at(30))).unwrap();

        assert_eq!(
            outcome,
            MergeOutcome::Appended {
                conversation_id: a,
                reordered: false,
                rank: 0
            }
        );
        assert_eq!(rank.as_slice(), &[a, b]);
        assert_eq!(index.get(&a).unwrap().latest().unwrap().body, "reply");
    }

    #[test]
    fn test_unknown_conversation_rejected_without_mutation() {
        let (mut index, mut rank, ids) = seeded(&[10, 20]);
        let before_rank = rank.clone();
        let before_len: Vec<usize> = ids
            .iter()
            .map(|id| index.get(id).unwrap().messages.len())
            .collect();

        let stranger = ConversationId::new();
        let result = merge(&mut index, &mut rank, Message::agent(stranger, "hi", at(40)));

        assert!(matches!(result, Err(InboxError::UnknownConversation(id)) if id == stranger));
        assert_eq!(rank, before_rank);
        assert_eq!(index.len(), 2);
        let after_len: Vec<usize> = ids
            .iter()
            .map(|id| index.get(id).unwrap().messages.len())
            .collect();
        assert_eq!(after_len, before_len);
    }

    #[test]
    fn test_unknown_conversation_created_when_allowed() {
        let (mut index, mut rank, _) = seeded(&[10, 20]);
        let stranger = ConversationId::new();

        let outcome = merge_message(
            &mut index,
            &mut rank,
            Message::customer(stranger, CustomerId::new(), "hello?", at(50)),
            UnknownConversationPolicy::Create,
            "Anonymous User",
        )
        .unwrap();

        assert_eq!(
            outcome,
            MergeOutcome::Created {
                conversation_id: stranger,
                rank: 0
            }
        );
        assert_eq!(rank.len(), 3);
        assert_eq!(index.get(&stranger).unwrap().customer, "Anonymous User");
    }

    #[test]
    fn test_duplicate_delivery_is_ignored() {
        let (mut index, mut rank, ids) = seeded(&[10, 20]);
        let a = ids[0];
        let message = Message::agent(a, "once", at(30)).with_id(MessageId::new());

        merge(&mut index, &mut rank, message.clone()).unwrap();
        let outcome = merge(&mut index, &mut rank, message).unwrap();

        assert_eq!(outcome, MergeOutcome::Duplicate { conversation_id: a });
        assert!(!outcome.changed());
        assert_eq!(index.get(&a).unwrap().messages.len(), 2);
    }

    #[test]
    fn test_duplicate_without_id_detected_by_fingerprint() {
        let (mut index, mut rank, ids) = seeded(&[10]);
        let a = ids[0];

        merge(&mut index, &mut rank, Message::agent(a, "same", at(30))).unwrap();
        let outcome = merge(&mut index, &mut rank, Message::agent(a, "same", at(30))).unwrap();

        assert!(!outcome.changed());
        assert_eq!(index.get(&a).unwrap().messages.len(), 2);
    }

    #[test]
    fn test_out_of_order_message_resorts_thread() {
        let (mut index, mut rank, ids) = seeded(&[10, 20]);
        let a = ids[0];
        merge(&mut index, &mut rank, Message::agent(a, "later", at(30))).unwrap();

        let outcome = merge(&mut index, &mut rank, Message::agent(a, "earlier", at(15))).unwrap();

        assert!(matches!(
            outcome,
            MergeOutcome::Appended {
                reordered: true,
                ..
            }
        ));
        let thread = &index.get(&a).unwrap().messages;
        assert!(thread.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(thread.last().unwrap().body, "later");
        assert_eq!(rank.head(), Some(a));
    }

    #[test]
    fn test_late_message_still_moves_to_front() {
        let (mut index, mut rank, ids) = seeded(&[10, 20, 30]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        let outcome = merge(&mut index, &mut rank, Message::agent(a, "late", at(25))).unwrap();

        assert_eq!(outcome.conversation_id(), a);
        assert_eq!(rank.as_slice(), &[a, c, b]);
    }

    #[test]
    fn test_unparseable_time_does_not_pin_conversation_to_front() {
        let (mut index, mut rank, ids) = seeded(&[20]);
        let recent = ids[0];
        let broken = ConversationId::new();
        merge_message(
            &mut index,
            &mut rank,
            Message::agent(broken, "garbled", MessageTime::Unknown),
            UnknownConversationPolicy::Create,
            "Anonymous User",
        )
        .unwrap();
        assert_eq!(rank.head(), Some(broken));

        merge(&mut index, &mut rank, Message::agent(recent, "fresh", at(59))).unwrap();

        assert_eq!(rank.as_slice(), &[recent, broken]);
        assert_eq!(rank_conversations(&index).as_slice(), &[recent, broken]);
    }

    #[test]
    fn test_distinct_unparseable_timestamps_are_not_duplicates() {
        let (mut index, mut rank, ids) = seeded(&[10]);
        let a = ids[0];
        let raw = |created_at: &str| RawMessage {
            body: Some("ok".to_string()),
            created_at: Some(created_at.to_string()),
            conversation_id: Some(a.to_string()),
            ..RawMessage::default()
        };

        let first = raw("garbage-1").into_message(None).unwrap();
        let second = raw("garbage-2").into_message(None).unwrap();
        let repeat = raw("garbage-2").into_message(None).unwrap();

        assert!(merge(&mut index, &mut rank, first).unwrap().changed());
        assert!(merge(&mut index, &mut rank, second).unwrap().changed());
        assert!(!merge(&mut index, &mut rank, repeat).unwrap().changed());
        assert_eq!(index.get(&a).unwrap().messages.len(), 3);
    }

    fn assert_permutation(index: &ConversationIndex, rank: &RankOrder) {
        let mut ranked = rank.as_slice().to_vec();
        let mut indexed = index.arrival_order().to_vec();
        ranked.sort();
        indexed.sort();
        assert_eq!(ranked, indexed);
        assert_eq!(rank.len(), index.len());
    }

    #[test]
    fn test_rank_stays_permutation_across_merges() {
        let (mut index, mut rank, ids) = seeded(&[10, 20, 30]);
        let (a, b) = (ids[0], ids[1]);
        let repeated = Message::agent(b, "again", at(40)).with_id(MessageId::new());
        let steps = vec![
            (Message::agent(a, "append", at(35)), UnknownConversationPolicy::Reject),
            (
                Message::agent(ConversationId::new(), "new", at(36)),
                UnknownConversationPolicy::Create,
            ),
            (repeated.clone(), UnknownConversationPolicy::Reject),
            (repeated, UnknownConversationPolicy::Reject),
            (Message::agent(a, "earlier", at(5)), UnknownConversationPolicy::Reject),
            (
                Message::agent(ConversationId::new(), "stray", at(50)),
                UnknownConversationPolicy::Reject,
            ),
        ];

        assert_permutation(&index, &rank);
        for (message, policy) in steps {
            let _ = merge_message(&mut index, &mut rank, message, policy, "Anonymous User");
            assert_permutation(&index, &rank);
        }
        assert_eq!(index.len(), 4);
        assert_eq!(rank.head(), Some(a));
    }
}
