//! Inbox state: indexed conversations, rank order and selection.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::inbox::collaborators::notification_feed::Subscription;
use crate::inbox::core::config::InboxConfig;
use crate::inbox::core::conversation::Conversation;
use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::core::ids::ConversationId;
use crate::inbox::core::message::Message;
use crate::inbox::engine::outbound::{OutboundMessage, compose};
use crate::inbox::index::indexer::{ConversationIndex, index_conversations};
use crate::inbox::index::merger::{MergeOutcome, merge_message};
use crate::inbox::index::ranker::{RankOrder, rank_conversations};
use crate::inbox::ingest::wire::{RawConversation, RawMessage, validate_snapshot};
use crate::inbox::presentation::views::{
    ConversationRow, MessageView, conversation_row, thread_view,
};

/// State of one inbox session.
///
/// Built once from a snapshot, then updated one notification at a time.
/// Every transition validates before mutating, so a failed call leaves the
/// state exactly as it was.
#[derive(Clone, Debug)]
pub struct InboxState {
    config: InboxConfig,
    index: ConversationIndex,
    rank: RankOrder,
    selected: Option<ConversationId>,
}

impl InboxState {
    /// State with no conversations.
    #[must_use]
    pub fn empty(config: InboxConfig) -> Self {
        Self {
            config,
            index: ConversationIndex::default(),
            rank: RankOrder::default(),
            selected: None,
        }
    }

    /// Index, rank and select the most recent conversation.
    ///
    /// # Errors
    /// Returns `EmptySnapshot` when there is nothing to load (callers may fall
    /// back to [`InboxState::empty`]) and `DuplicateConversation` for repeated
    /// ids.
    pub fn load_snapshot(config: InboxConfig, conversations: Vec<Conversation>) -> InboxResult<Self> {
        let index = index_conversations(conversations)?;
        let rank = rank_conversations(&index);
        let selected = rank.head();
        info!(
            conversations = index.len(),
            selected = ?selected,
            "Loaded inbox snapshot"
        );

        Ok(Self {
            config,
            index,
            rank,
            selected,
        })
    }

    /// Validate wire records, then [`InboxState::load_snapshot`].
    ///
    /// # Errors
    /// Returns `InvalidRecord` for malformed records, otherwise as
    /// [`InboxState::load_snapshot`].
    pub fn load_raw_snapshot(config: InboxConfig, raw: Vec<RawConversation>) -> InboxResult<Self> {
        let conversations = validate_snapshot(raw, &config.default_customer)?;
        Self::load_snapshot(config, conversations)
    }

    /// Merge one incoming message.
    ///
    /// Selection does not follow new activity, except that the first
    /// conversation opened in an empty inbox becomes selected.
    ///
    /// # Errors
    /// Returns `UnknownConversation` when the conversation is not indexed and
    /// the configured policy rejects it.
    pub fn merge_incoming(&mut self, message: Message) -> InboxResult<MergeOutcome> {
        let outcome = merge_message(
            &mut self.index,
            &mut self.rank,
            message,
            self.config.unknown_conversations,
            &self.config.default_customer,
        )
        .inspect_err(|err| warn!(%err, "Rejected incoming message"))?;

        if self.selected.is_none() {
            self.selected = Some(outcome.conversation_id());
        }
        Ok(outcome)
    }

    /// Validate a streamed record, then [`InboxState::merge_incoming`].
    ///
    /// # Errors
    /// Returns `InvalidRecord` for malformed records, otherwise as
    /// [`InboxState::merge_incoming`].
    pub fn merge_raw(&mut self, raw: RawMessage) -> InboxResult<MergeOutcome> {
        let message = raw.into_message(None)?;
        self.merge_incoming(message)
    }

    /// Change the selected conversation. Rank order is untouched.
    ///
    /// # Errors
    /// Returns `UnknownConversation` if `id` is not indexed.
    pub fn select_conversation(&mut self, id: ConversationId) -> InboxResult<()> {
        if !self.index.contains(&id) {
            return Err(InboxError::UnknownConversation(id));
        }
        debug!(conversation_id = %id, "Selected conversation");
        self.selected = Some(id);
        Ok(())
    }

    /// Build an outbound agent message for the selected conversation.
    ///
    /// # Errors
    /// Returns `NoSelection` or `EmptyMessage`.
    pub fn compose_outbound(&self, body: &str) -> InboxResult<OutboundMessage> {
        compose(
            body,
            self.selected,
            self.config.account_id,
            &self.config.user_id,
        )
    }

    /// Notification subscription covering every indexed conversation.
    #[must_use]
    pub fn subscription(&self) -> Subscription {
        Subscription {
            topic: self.config.notification_topic(),
            conversation_ids: self.index.arrival_order().to_vec(),
        }
    }

    /// Conversation list rows in rank order.
    #[must_use]
    pub fn conversation_rows(&self, now: DateTime<Utc>) -> Vec<ConversationRow> {
        self.rank
            .iter()
            .filter_map(|id| self.index.get(id))
            .map(|conversation| {
                conversation_row(
                    conversation,
                    self.selected,
                    &self.config.preview_placeholder,
                    now,
                )
            })
            .collect()
    }

    /// Thread view of a conversation.
    ///
    /// # Errors
    /// Returns `UnknownConversation` if `id` is not indexed.
    pub fn thread(&self, id: ConversationId) -> InboxResult<Vec<MessageView>> {
        self.index
            .get(&id)
            .map(|conversation| thread_view(&conversation.messages))
            .ok_or(InboxError::UnknownConversation(id))
    }

    /// Thread view of the selected conversation (empty without selection).
    #[must_use]
    pub fn selected_thread(&self) -> Vec<MessageView> {
        self.selected
            .and_then(|id| self.index.get(&id))
            .map(|conversation| thread_view(&conversation.messages))
            .unwrap_or_default()
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &InboxConfig {
        &self.config
    }

    /// Indexed conversations.
    #[must_use]
    pub const fn index(&self) -> &ConversationIndex {
        &self.index
    }

    /// Current rank order.
    #[must_use]
    pub const fn rank(&self) -> &RankOrder {
        &self.rank
    }

    /// Selected conversation, `None` only when the inbox is empty.
    #[must_use]
    pub const fn selected(&self) -> Option<ConversationId> {
        self.selected
    }
}
