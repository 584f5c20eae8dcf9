//! Message model for support conversations.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inbox::core::ids::{ConversationId, CustomerId, MessageId};
use crate::inbox::ingest::fingerprint::fingerprint_message;

/// Who wrote a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Support agent.
    Agent,
    /// End customer.
    Customer,
}

impl Sender {
    /// Stable string form for the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Customer => "customer",
        }
    }

    /// Role implied by the presence of a customer id.
    #[must_use]
    pub const fn infer(customer_id: Option<&CustomerId>) -> Self {
        if customer_id.is_some() {
            Self::Customer
        } else {
            Self::Agent
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "agent" => Ok(Self::Agent),
            "customer" => Ok(Self::Customer),
            _ => Err(value.to_string()),
        }
    }
}

/// Creation time of a message.
///
/// Timestamps that fail to parse become [`MessageTime::Unknown`], which orders
/// after every known instant so broken records end up at the tail of a thread.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<DateTime<Utc>>", into = "Option<DateTime<Utc>>")]
pub enum MessageTime {
    /// A parsed UTC instant.
    At(DateTime<Utc>),
    /// The upstream value could not be parsed.
    Unknown,
}

impl MessageTime {
    /// Parse an upstream timestamp.
    ///
    /// Accepts RFC 3339 and naive ISO 8601 (assumed UTC). Anything else is
    /// [`MessageTime::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Self::At(parsed.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Self::At(naive.and_utc());
            }
        }
        Self::Unknown
    }

    /// The parsed instant, if any.
    #[must_use]
    pub const fn instant(self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(at) => Some(at),
            Self::Unknown => None,
        }
    }

    /// Whether the upstream value failed to parse.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl Ord for MessageTime {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::At(a), Self::At(b)) => a.cmp(b),
            (Self::At(_), Self::Unknown) => Ordering::Less,
            (Self::Unknown, Self::At(_)) => Ordering::Greater,
            (Self::Unknown, Self::Unknown) => Ordering::Equal,
        }
    }
}

impl PartialOrd for MessageTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<DateTime<Utc>> for MessageTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self::At(value)
    }
}

impl From<Option<DateTime<Utc>>> for MessageTime {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Unknown, Self::At)
    }
}

impl From<MessageTime> for Option<DateTime<Utc>> {
    fn from(value: MessageTime) -> Self {
        value.instant()
    }
}

impl fmt::Display for MessageTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(at) => write!(f, "{}", at.to_rfc3339()),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Identity used to detect repeated delivery of the same message.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum MessageKey {
    /// Upstream-assigned message id.
    Id(MessageId),
    /// Content fingerprint for records delivered without an id.
    Fingerprint(String),
}

/// A single message in a conversation. Immutable once created.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Upstream id, when the record carried one.
    pub id: Option<MessageId>,
    /// Author role.
    pub sender: Sender,
    /// Text content.
    pub body: String,
    /// Ordering key.
    pub created_at: MessageTime,
    /// Upstream timestamp text when it failed to parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unparsed_created_at: Option<String>,
    /// Customer who wrote the message, if any.
    pub customer_id: Option<CustomerId>,
    /// Conversation the message belongs to.
    pub conversation_id: ConversationId,
}

impl Message {
    /// Build a customer message.
    #[must_use]
    pub fn customer(
        conversation_id: ConversationId,
        customer_id: CustomerId,
        body: impl Into<String>,
        created_at: impl Into<MessageTime>,
    ) -> Self {
        Self {
            id: None,
            sender: Sender::Customer,
            body: body.into(),
            created_at: created_at.into(),
            unparsed_created_at: None,
            customer_id: Some(customer_id),
            conversation_id,
        }
    }

    /// Build an agent message.
    #[must_use]
    pub fn agent(
        conversation_id: ConversationId,
        body: impl Into<String>,
        created_at: impl Into<MessageTime>,
    ) -> Self {
        Self {
            id: None,
            sender: Sender::Agent,
            body: body.into(),
            created_at: created_at.into(),
            unparsed_created_at: None,
            customer_id: None,
            conversation_id,
        }
    }

    /// Attach an upstream id.
    #[must_use]
    pub const fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    /// Identity used for de-duplication.
    ///
    /// Messages without an upstream id are fingerprinted on their content and
    /// timestamp, using the upstream text when the timestamp did not parse.
    #[must_use]
    pub fn key(&self) -> MessageKey {
        self.id.map_or_else(
            || {
                let created_at = self
                    .unparsed_created_at
                    .clone()
                    .unwrap_or_else(|| self.created_at.to_string());
                MessageKey::Fingerprint(fingerprint_message(
                    self.conversation_id,
                    self.sender,
                    &self.body,
                    &created_at,
                ))
            },
            MessageKey::Id,
        )
    }
}
