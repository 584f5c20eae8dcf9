//! Inbox state transitions and outbound composition.

pub mod outbound;
pub mod state;

pub use outbound::{OutboundMessage, compose};
pub use state::InboxState;
