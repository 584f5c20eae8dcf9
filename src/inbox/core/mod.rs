//! Core inbox types and identifiers.

pub mod config;
pub mod conversation;
pub mod errors;
pub mod ids;
pub mod message;

pub use config::{InboxConfig, UnknownConversationPolicy};
pub use conversation::Conversation;
pub use errors::{InboxError, InboxResult};
pub use ids::{AccountId, ConversationId, CustomerId, MessageId, UserId, UserIdError};
pub use message::{Message, MessageKey, MessageTime, Sender};
