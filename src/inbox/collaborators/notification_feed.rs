//! Real-time notification subscription.

use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::inbox::collaborators::CollaboratorFuture;
use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::core::ids::ConversationId;
use crate::inbox::ingest::wire::RawMessage;

/// Stream of single-message notifications.
pub type NotificationStream = BoxStream<'static, RawMessage>;

/// Scope of a notification subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Account topic, `notification:{account_id}`.
    pub topic: String,
    /// Conversations the subscriber cares about.
    pub conversation_ids: Vec<ConversationId>,
}

/// Source of streamed messages.
pub trait NotificationFeed: Send + Sync {
    /// Join the topic and start receiving messages.
    ///
    /// # Errors
    /// Returns an error if the subscription cannot be established.
    fn subscribe(
        &self,
        subscription: Subscription,
    ) -> CollaboratorFuture<'_, InboxResult<NotificationStream>>;
}

/// Feed backed by an in-process channel.
///
/// Whoever holds the sender half plays the upstream notification socket.
pub struct ChannelFeed {
    receiver: Mutex<Option<mpsc::Receiver<RawMessage>>>,
    joined: Mutex<Option<Subscription>>,
}

impl ChannelFeed {
    /// Create a feed and the sender that publishes into it.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<RawMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let feed = Self {
            receiver: Mutex::new(Some(receiver)),
            joined: Mutex::new(None),
        };
        (feed, sender)
    }

    /// Subscription of the current subscriber, if any.
    pub async fn joined(&self) -> Option<Subscription> {
        self.joined.lock().await.clone()
    }
}

impl NotificationFeed for ChannelFeed {
    fn subscribe(
        &self,
        subscription: Subscription,
    ) -> CollaboratorFuture<'_, InboxResult<NotificationStream>> {
        Box::pin(async move {
            let receiver = self
                .receiver
                .lock()
                .await
                .take()
                .ok_or_else(|| InboxError::Feed("channel feed already subscribed".to_string()))?;

            info!(
                topic = %subscription.topic,
                conversations = subscription.conversation_ids.len(),
                "Joined notification channel"
            );
            *self.joined.lock().await = Some(subscription);

            Ok(ReceiverStream::new(receiver).boxed())
        })
    }
}
