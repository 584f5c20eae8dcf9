//! Outbound send collaborator.

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use url::Url;

use crate::inbox::collaborators::{CollaboratorFuture, endpoint};
use crate::inbox::core::errors::InboxResult;
use crate::inbox::core::ids::MessageId;
use crate::inbox::engine::outbound::OutboundMessage;
use crate::inbox::ingest::wire::RawMessage;

/// Sink for agent-written messages. No acknowledgement is tracked.
pub trait MessageSender: Send + Sync {
    /// Push one message upstream.
    ///
    /// # Errors
    /// Returns an error if the message could not be handed to the transport.
    fn send(&self, message: OutboundMessage) -> CollaboratorFuture<'_, InboxResult<()>>;
}

/// Sender that keeps every message in memory.
///
/// With an echo channel it also plays the upstream broadcast, publishing each
/// sent message back into a notification feed the way the real socket does.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutboundMessage>>,
    echo: Option<mpsc::Sender<RawMessage>>,
}

impl RecordingSender {
    /// Sender without echo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender that republishes every message into `echo`.
    #[must_use]
    pub fn with_echo(echo: mpsc::Sender<RawMessage>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            echo: Some(echo),
        }
    }

    /// Messages sent so far.
    pub async fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }
}

fn echo_record(message: &OutboundMessage) -> RawMessage {
    RawMessage {
        id: Some(MessageId::new().to_string()),
        sender: Some(message.sender.to_string()),
        body: Some(message.body.clone()),
        created_at: Some(Utc::now().to_rfc3339()),
        customer_id: None,
        conversation_id: Some(message.conversation_id.to_string()),
    }
}

impl MessageSender for RecordingSender {
    fn send(&self, message: OutboundMessage) -> CollaboratorFuture<'_, InboxResult<()>> {
        Box::pin(async move {
            if let Some(echo) = &self.echo
                && echo.send(echo_record(&message)).await.is_err()
            {
                warn!(conversation_id = %message.conversation_id, "Echo feed closed");
            }
            debug!(conversation_id = %message.conversation_id, "Recorded outbound message");
            self.sent.lock().await.push(message);
            Ok(())
        })
    }
}

/// Sender posting to `POST {base}/api/messages`.
pub struct HttpMessageSender {
    client: reqwest::Client,
    url: Url,
}

impl HttpMessageSender {
    /// Create a sender for the given API base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn new(client: reqwest::Client, base_url: &str) -> InboxResult<Self> {
        let url = endpoint(base_url, "api/messages")?;
        Ok(Self { client, url })
    }
}

impl MessageSender for HttpMessageSender {
    fn send(&self, message: OutboundMessage) -> CollaboratorFuture<'_, InboxResult<()>> {
        Box::pin(async move {
            debug!(url = %self.url, conversation_id = %message.conversation_id, "Posting message");
            self.client
                .post(self.url.clone())
                .json(&message)
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbox::core::ids::{AccountId, ConversationId, UserId};
    use crate::inbox::core::message::Sender;

    fn outbound(body: &str) -> OutboundMessage {
        OutboundMessage {
            body: body.to_string(),
            sender: Sender::Agent,
            conversation_id: ConversationId::new(),
            account_id: AccountId::new(),
            user_id: UserId::default(),
        }
    }

    #[tokio::test]
    async fn test_recording_sender_keeps_messages() {
        let sender = RecordingSender::new();
        sender.send(outbound("one")).await.unwrap();
        sender.send(outbound("two")).await.unwrap();

        let sent = sender.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].body, "two");
    }

    #[tokio::test]
    async fn test_recording_sender_echoes() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = RecordingSender::with_echo(tx);
        let message = outbound("hello");
        let conversation_id = message.conversation_id;

        sender.send(message).await.unwrap();

        let echoed = rx.recv().await.unwrap();
        assert_eq!(echoed.body.as_deref(), Some("hello"));
        assert_eq!(echoed.sender.as_deref(), Some("agent"));
        let parsed = echoed.into_message(None).unwrap();
        assert_eq!(parsed.conversation_id, conversation_id);
        assert!(parsed.id.is_some());
    }

    #[tokio::test]
    async fn test_echo_to_closed_feed_still_records() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = RecordingSender::with_echo(tx);
        sender.send(outbound("lost")).await.unwrap();
        assert_eq!(sender.sent().await.len(), 1);
    }

    #[test]
    fn test_http_sender_builds_endpoint() {
        let sender = HttpMessageSender::new(reqwest::Client::new(), "http://localhost:4000").unwrap();
        assert_eq!(sender.url.as_str(), "http://localhost:4000/api/messages");
    }
}
