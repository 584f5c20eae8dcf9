//! Recency ranking of conversations.

use std::cmp::Reverse;
use std::slice;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::inbox::core::conversation::Conversation;
use crate::inbox::core::ids::ConversationId;
use crate::inbox::index::indexer::ConversationIndex;

/// Conversation ids, most recently active first.
///
/// Always a permutation of the index's key set. Built by latest activity with
/// ties in arrival order; each merge then moves the receiving conversation to
/// the front.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankOrder(Vec<ConversationId>);

impl RankOrder {
    /// Ids as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ConversationId] {
        &self.0
    }

    /// Iterate ids in rank order.
    pub fn iter(&self) -> slice::Iter<'_, ConversationId> {
        self.0.iter()
    }

    /// Number of ranked conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recently active conversation.
    #[must_use]
    pub fn head(&self) -> Option<ConversationId> {
        self.0.first().copied()
    }

    /// Position of a conversation.
    #[must_use]
    pub fn position(&self, id: &ConversationId) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == id)
    }

    /// Move `id` to the front, keeping the relative order of all other ids.
    pub(crate) fn move_to_front(&mut self, id: ConversationId) {
        self.0.retain(|candidate| *candidate != id);
        self.0.insert(0, id);
    }
}

impl<'a> IntoIterator for &'a RankOrder {
    type Item = &'a ConversationId;
    type IntoIter = slice::Iter<'a, ConversationId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ranking key: latest parseable message time.
///
/// `None` (oldest) for empty threads and for threads whose every timestamp
/// failed to parse.
#[must_use]
pub fn rank_key(index: &ConversationIndex, id: &ConversationId) -> Option<DateTime<Utc>> {
    index.get(id).and_then(Conversation::latest_known_activity)
}

/// Rank every indexed conversation by latest activity, newest first.
#[must_use]
pub fn rank_conversations(index: &ConversationIndex) -> RankOrder {
    let mut ids = index.arrival_order().to_vec();
    ids.sort_by_key(|id| Reverse(rank_key(index, id)));
    RankOrder(ids)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::inbox::core::message::{Message, MessageTime};
    use crate::inbox::index::indexer::index_conversations;

    fn at(minute: u32) -> MessageTime {
        MessageTime::At(Utc.with_ymd_and_hms(2020, 1, 1, 0, minute, 0).unwrap())
    }

    fn conversation(times: &[MessageTime]) -> Conversation {
        let id = ConversationId::new();
        let mut conversation = Conversation::new(id, "c");
        conversation.messages = times
            .iter()
            .map(|time| Message::agent(id, "m", *time))
            .collect();
        conversation
    }

    #[test]
    fn test_newest_first() {
        let a = conversation(&[at(10)]);
        let b = conversation(&[at(20)]);
        let (a_id, b_id) = (a.id, b.id);
        let index = index_conversations(vec![a, b]).unwrap();

        let rank = rank_conversations(&index);
        assert_eq!(rank.as_slice(), &[b_id, a_id]);
        assert_eq!(rank.head(), Some(b_id));
    }

    #[test]
    fn test_empty_thread_ranks_oldest() {
        let a = conversation(&[at(1)]);
        let b = conversation(&[]);
        let (a_id, b_id) = (a.id, b.id);
        let index = index_conversations(vec![b, a]).unwrap();

        let rank = rank_conversations(&index);
        assert_eq!(rank.as_slice(), &[a_id, b_id]);
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let convs: Vec<Conversation> = (0..3).map(|_| conversation(&[at(5)])).collect();
        let ids: Vec<ConversationId> = convs.iter().map(|c| c.id).collect();
        let index = index_conversations(convs).unwrap();

        assert_eq!(rank_conversations(&index).as_slice(), ids.as_slice());
    }

    #[test]
    fn test_rank_is_permutation() {
        let convs = vec![
            conversation(&[at(3), at(1)]),
            conversation(&[]),
            conversation(&[MessageTime::Unknown]),
            conversation(&[at(7)]),
            conversation(&[]),
        ];
        let mut ids: Vec<ConversationId> = convs.iter().map(|c| c.id).collect();
        let index = index_conversations(convs).unwrap();

        let rank = rank_conversations(&index);
        assert_eq!(rank.len(), ids.len());
        let mut ranked = rank.as_slice().to_vec();
        ranked.sort();
        ids.sort();
        assert_eq!(ranked, ids);
    }

    #[test]
    fn test_move_to_front_keeps_others_in_order() {
        let a = conversation(&[at(10)]);
        let b = conversation(&[at(20)]);
        let c = conversation(&[at(30)]);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        let index = index_conversations(vec![a, b, c]).unwrap();
        let mut rank = rank_conversations(&index);
        assert_eq!(rank.as_slice(), &[c_id, b_id, a_id]);

        rank.move_to_front(b_id);
        assert_eq!(rank.as_slice(), &[b_id, c_id, a_id]);
        rank.move_to_front(a_id);
        assert_eq!(rank.as_slice(), &[a_id, b_id, c_id]);
    }

    #[test]
    fn test_unparseable_times_do_not_outrank_real_activity() {
        let broken_tail = conversation(&[at(10), MessageTime::Unknown]);
        let all_broken = conversation(&[MessageTime::Unknown]);
        let empty = conversation(&[]);
        let recent = conversation(&[at(20)]);
        let ids = [broken_tail.id, all_broken.id, empty.id, recent.id];
        let index = index_conversations(vec![broken_tail, all_broken, empty, recent]).unwrap();

        assert_eq!(rank_key(&index, &ids[0]), at(10).instant());
        assert_eq!(rank_key(&index, &ids[1]), None);

        let rank = rank_conversations(&index);
        assert_eq!(rank.as_slice(), &[ids[3], ids[0], ids[1], ids[2]]);
    }
}
