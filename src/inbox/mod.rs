//! Support inbox subsystem.
//!
//! Keeps the conversations of one support account ordered for display and up
//! to date with the real-time feed:
//! - `core`: Configuration, errors, IDs, messages and conversations
//! - `ingest`: Wire records and boundary validation
//! - `index`: Snapshot indexing, recency ranking and streamed merges
//! - `engine`: Inbox state transitions and outbound composition
//! - `presentation`: Conversation rows, thread views and relative dates
//! - `collaborators`: Bulk fetch, notification feed and send seams
//! - `session`: Bootstrap and the notification loop

pub mod collaborators;
pub mod core;
pub mod engine;
pub mod index;
pub mod ingest;
pub mod presentation;
pub mod session;

// Re-export commonly used types for convenience
pub use collaborators::{
    ChannelFeed, CollaboratorFuture, HttpMessageSender, HttpSnapshotSource,
    InMemorySnapshotSource, MessageSender, NotificationFeed, NotificationStream,
    RecordingSender, SnapshotSource, Subscription,
};
pub use core::{
    AccountId, Conversation, ConversationId, CustomerId, InboxConfig, InboxError, InboxResult,
    Message, MessageId, MessageKey, MessageTime, Sender, UnknownConversationPolicy, UserId,
};
pub use engine::{InboxState, OutboundMessage};
pub use index::{ConversationIndex, MergeOutcome, RankOrder};
pub use ingest::{RawConversation, RawMessage};
pub use presentation::{ConversationRow, MessageView};
pub use session::{InboxSession, SessionStats, SharedInbox, bootstrap_state};
