//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::inbox::collaborators::message_sender::MessageSender;
use crate::inbox::session::driver::SharedInbox;

/// Shared application state.
pub struct AppState {
    /// Inbox state, also written by the notification session.
    pub inbox: SharedInbox,
    /// Outbound send collaborator.
    pub sender: Arc<dyn MessageSender>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(inbox: SharedInbox, sender: Arc<dyn MessageSender>) -> Arc<Self> {
        Arc::new(Self { inbox, sender })
    }
}
