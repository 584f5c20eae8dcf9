//! Outbound messages written by the agent.

use serde::{Deserialize, Serialize};

use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::core::ids::{AccountId, ConversationId, UserId};
use crate::inbox::core::message::Sender;

/// Message pushed to the send collaborator.
///
/// Fire-and-forget: it only shows up in the thread once echoed back through
/// the notification feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Text content, as typed.
    pub body: String,
    /// Always [`Sender::Agent`].
    pub sender: Sender,
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Account the agent belongs to.
    pub account_id: AccountId,
    /// Agent user id.
    pub user_id: UserId,
}

/// Build an outbound agent message.
///
/// # Errors
/// Returns `NoSelection` without a target conversation and `EmptyMessage`
/// for a blank body.
pub fn compose(
    body: &str,
    conversation_id: Option<ConversationId>,
    account_id: AccountId,
    user_id: &UserId,
) -> InboxResult<OutboundMessage> {
    let conversation_id = conversation_id.ok_or(InboxError::NoSelection)?;
    if body.trim().is_empty() {
        return Err(InboxError::EmptyMessage);
    }

    Ok(OutboundMessage {
        body: body.to_string(),
        sender: Sender::Agent,
        conversation_id,
        account_id,
        user_id: user_id.clone(),
    })
}
