//! Error types for the inbox subsystem.

use thiserror::Error;

use crate::inbox::core::ids::ConversationId;

/// Inbox subsystem error type.
#[derive(Debug, Error)]
pub enum InboxError {
    /// The bulk fetch returned no conversations.
    #[error("snapshot contains no conversations")]
    EmptySnapshot,
    /// A message references a conversation absent from the index.
    #[error("unknown conversation: {0}")]
    UnknownConversation(ConversationId),
    /// The snapshot lists the same conversation twice.
    #[error("duplicate conversation in snapshot: {0}")]
    DuplicateConversation(ConversationId),
    /// A wire record failed shape validation.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Outbound message body is blank.
    #[error("message body is empty")]
    EmptyMessage,
    /// Outbound message without a selected conversation.
    #[error("no conversation selected")]
    NoSelection,
    /// Notification feed cannot be subscribed or has closed.
    #[error("notification feed error: {0}")]
    Feed(String),
    /// HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for inbox operations.
pub type InboxResult<T> = Result<T, InboxError>;
