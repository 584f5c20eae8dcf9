//! Display rows derived from inbox state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::inbox::core::conversation::Conversation;
use crate::inbox::core::ids::{ConversationId, CustomerId};
use crate::inbox::core::message::{Message, MessageTime, Sender};
use crate::inbox::presentation::relative_time::format_relative;

/// One entry of the conversation list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationRow {
    /// Conversation id.
    pub id: ConversationId,
    /// Customer label.
    pub customer: String,
    /// Relative age of the conversation.
    pub date: String,
    /// Latest message body or placeholder.
    pub preview: String,
    /// Latest activity, if known.
    pub last_activity: Option<DateTime<Utc>>,
    /// Whether the row is the selected conversation.
    pub is_selected: bool,
}

/// One message of a thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageView {
    /// Author role, inferred from the customer id.
    pub sender: Sender,
    /// Text content.
    pub body: String,
    /// Creation time (`null` when unknown).
    pub created_at: MessageTime,
    /// Customer author, if any.
    pub customer_id: Option<CustomerId>,
    /// Written by an agent.
    pub is_me: bool,
    /// Next message comes from someone else (or there is none).
    pub is_last_in_group: bool,
    /// Timestamp shown under this message.
    pub show_timestamp: bool,
}

/// Build the list row for a conversation.
///
/// The age counts from when the conversation was opened, falling back to its
/// latest message when the upstream record has no creation time.
#[must_use]
pub fn conversation_row(
    conversation: &Conversation,
    selected: Option<ConversationId>,
    placeholder: &str,
    now: DateTime<Utc>,
) -> ConversationRow {
    let latest = conversation.latest_activity();
    let opened = conversation
        .created_at
        .map(MessageTime::At)
        .or(latest)
        .unwrap_or(MessageTime::Unknown);

    ConversationRow {
        id: conversation.id,
        customer: conversation.customer.clone(),
        date: format_relative(opened, now),
        preview: conversation.preview(placeholder).to_string(),
        last_activity: latest.and_then(MessageTime::instant),
        is_selected: selected == Some(conversation.id),
    }
}

/// Build the thread view, grouping consecutive messages by author.
#[must_use]
pub fn thread_view(messages: &[Message]) -> Vec<MessageView> {
    messages
        .iter()
        .enumerate()
        .map(|(position, message)| {
            let sender = Sender::infer(message.customer_id.as_ref());
            let is_last_in_group = messages
                .get(position + 1)
                .is_none_or(|next| next.customer_id != message.customer_id);
            MessageView {
                sender,
                body: message.body.clone(),
                created_at: message.created_at,
                customer_id: message.customer_id,
                is_me: sender == Sender::Agent,
                is_last_in_group,
                show_timestamp: is_last_in_group,
            }
        })
        .collect()
}
