//! External collaborators: bulk fetch, real-time feed and send.
//!
//! The inbox core never talks to a transport directly. It goes through these
//! traits so the same state machine runs against the upstream API, a local
//! JSON snapshot, or in-memory channels in tests.

pub mod message_sender;
pub mod notification_feed;
pub mod snapshot_source;

use std::future::Future;
use std::pin::Pin;

use url::Url;

use crate::inbox::core::errors::InboxResult;

pub use message_sender::{HttpMessageSender, MessageSender, RecordingSender};
pub use notification_feed::{ChannelFeed, NotificationFeed, NotificationStream, Subscription};
pub use snapshot_source::{HttpSnapshotSource, InMemorySnapshotSource, SnapshotSource};

/// Boxed future type for collaborator operations.
pub type CollaboratorFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolve `path` below `base_url`, keeping any path prefix of the base.
///
/// # Errors
/// Returns an error if the base URL does not parse.
pub fn endpoint(base_url: &str, path: &str) -> InboxResult<Url> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}
