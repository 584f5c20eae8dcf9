//! Wire records from the bulk fetch and the notification stream.
//!
//! Upstream payloads are loosely shaped, so every field is deserialized as an
//! optional string and validated into the typed model here. Ids that do not
//! parse reject the record; timestamps that do not parse do not.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::inbox::core::conversation::Conversation;
use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::core::ids::{ConversationId, CustomerId, MessageId};
use crate::inbox::core::message::{Message, MessageTime, Sender};

/// Message as delivered upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Upstream message id.
    #[serde(default)]
    pub id: Option<String>,
    /// `agent` or `customer`.
    #[serde(default)]
    pub sender: Option<String>,
    /// Text content.
    #[serde(default)]
    pub body: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Customer author, if any.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Owning conversation.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Conversation as delivered by the bulk fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConversation {
    /// Conversation id.
    #[serde(default)]
    pub id: Option<String>,
    /// Customer display label.
    #[serde(default)]
    pub customer: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Embedded messages, unordered.
    #[serde(default)]
    pub messages: Option<Vec<RawMessage>>,
}

fn parse_id<T: std::str::FromStr>(field: &str, raw: &str) -> InboxResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| InboxError::InvalidRecord(format!("invalid {field} {raw:?}: {err}")))
}

impl RawMessage {
    /// Validate into a [`Message`].
    ///
    /// `container` supplies the conversation id for messages embedded in a
    /// snapshot conversation that omit their own.
    ///
    /// # Errors
    /// Returns `InvalidRecord` when an id is malformed, the body is missing, or
    /// no conversation id is available.
    pub fn into_message(self, container: Option<ConversationId>) -> InboxResult<Message> {
        let conversation_id = match (self.conversation_id.as_deref(), container) {
            (Some(raw), _) => parse_id("conversation_id", raw)?,
            (None, Some(container)) => container,
            (None, None) => {
                return Err(InboxError::InvalidRecord(
                    "message has no conversation_id".to_string(),
                ));
            }
        };

        let body = self
            .body
            .ok_or_else(|| InboxError::InvalidRecord("message has no body".to_string()))?;

        let id = self
            .id
            .as_deref()
            .map(|raw| parse_id::<MessageId>("message id", raw))
            .transpose()?;

        let customer_id = self
            .customer_id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_id::<CustomerId>("customer_id", raw))
            .transpose()?;

        let (created_at, unparsed_created_at) = match self.created_at {
            Some(raw) => {
                let parsed = MessageTime::parse(&raw);
                if parsed.is_unknown() {
                    warn!(%conversation_id, created_at = %raw, "Unparseable message timestamp");
                    (parsed, Some(raw))
                } else {
                    (parsed, None)
                }
            }
            None => {
                warn!(%conversation_id, "Message without timestamp");
                (MessageTime::Unknown, None)
            }
        };

        let inferred = Sender::infer(customer_id.as_ref());
        let sender = match self.sender.as_deref() {
            Some(raw) => raw.parse::<Sender>().unwrap_or_else(|unknown: String| {
                warn!(sender = %unknown, %inferred, "Unknown sender role, inferring");
                inferred
            }),
            None => inferred,
        };

        Ok(Message {
            id,
            sender,
            body,
            created_at,
            unparsed_created_at,
            customer_id,
            conversation_id,
        })
    }
}

impl From<&Message> for RawMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.map(|id| id.to_string()),
            sender: Some(message.sender.to_string()),
            body: Some(message.body.clone()),
            created_at: message
                .created_at
                .instant()
                .map(|at| at.to_rfc3339())
                .or_else(|| message.unparsed_created_at.clone()),
            customer_id: message.customer_id.map(|id| id.to_string()),
            conversation_id: Some(message.conversation_id.to_string()),
        }
    }
}

impl RawConversation {
    /// Validate into a [`Conversation`] with unsorted messages.
    ///
    /// # Errors
    /// Returns `InvalidRecord` when the conversation id or any embedded
    /// message is malformed.
    pub fn into_conversation(self, default_customer: &str) -> InboxResult<Conversation> {
        let raw_id = self
            .id
            .ok_or_else(|| InboxError::InvalidRecord("conversation has no id".to_string()))?;
        let id: ConversationId = parse_id("conversation id", &raw_id)?;

        let customer = self
            .customer
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| default_customer.to_string());

        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| MessageTime::parse(raw).instant());

        let messages = self
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|raw| raw.into_message(Some(id)))
            .collect::<InboxResult<Vec<_>>>()?;

        Ok(Conversation {
            id,
            customer,
            created_at,
            messages,
        })
    }
}

/// Validate a whole snapshot.
///
/// # Errors
/// Returns the first validation error encountered.
pub fn validate_snapshot(
    raw: Vec<RawConversation>,
    default_customer: &str,
) -> InboxResult<Vec<Conversation>> {
    raw.into_iter()
        .map(|conversation| conversation.into_conversation(default_customer))
        .collect()
}
