//! Bulk fetch of the initial conversation snapshot.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::inbox::collaborators::{CollaboratorFuture, endpoint};
use crate::inbox::core::errors::InboxResult;
use crate::inbox::ingest::wire::RawConversation;

/// Source of the initial snapshot.
pub trait SnapshotSource: Send + Sync {
    /// Fetch every conversation with its embedded messages.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read.
    fn fetch_conversations(&self) -> CollaboratorFuture<'_, InboxResult<Vec<RawConversation>>>;
}

/// Snapshot payloads come either bare or wrapped in `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotEnvelope {
    Bare(Vec<RawConversation>),
    Wrapped { data: Vec<RawConversation> },
}

impl SnapshotEnvelope {
    fn into_conversations(self) -> Vec<RawConversation> {
        match self {
            Self::Bare(conversations) => conversations,
            Self::Wrapped { data } => data,
        }
    }
}

/// Parse a snapshot JSON document.
///
/// # Errors
/// Returns a serialization error if the document has neither shape.
pub fn parse_snapshot(json: &str) -> InboxResult<Vec<RawConversation>> {
    let envelope: SnapshotEnvelope = serde_json::from_str(json)?;
    Ok(envelope.into_conversations())
}

/// Snapshot held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemorySnapshotSource {
    conversations: Vec<RawConversation>,
}

impl InMemorySnapshotSource {
    /// Wrap already-fetched records.
    #[must_use]
    pub const fn new(conversations: Vec<RawConversation>) -> Self {
        Self { conversations }
    }

    /// Read a snapshot from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> InboxResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let conversations = parse_snapshot(&json)?;
        info!(path = %path.display(), conversations = conversations.len(), "Read snapshot file");
        Ok(Self::new(conversations))
    }
}

impl SnapshotSource for InMemorySnapshotSource {
    fn fetch_conversations(&self) -> CollaboratorFuture<'_, InboxResult<Vec<RawConversation>>> {
        Box::pin(async move { Ok(self.conversations.clone()) })
    }
}

/// Snapshot fetched from `GET {base}/api/conversations`.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpSnapshotSource {
    /// Create a source for the given API base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn new(client: reqwest::Client, base_url: &str) -> InboxResult<Self> {
        let url = endpoint(base_url, "api/conversations")?;
        Ok(Self { client, url })
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch_conversations(&self) -> CollaboratorFuture<'_, InboxResult<Vec<RawConversation>>> {
        Box::pin(async move {
            debug!(url = %self.url, "Fetching conversations");
            let body = self
                .client
                .get(self.url.clone())
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            parse_snapshot(&body)
        })
    }
}
