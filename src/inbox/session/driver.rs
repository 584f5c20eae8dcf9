//! Session driver: bulk load, then apply notifications one at a time.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::inbox::collaborators::notification_feed::NotificationFeed;
use crate::inbox::collaborators::snapshot_source::SnapshotSource;
use crate::inbox::core::config::InboxConfig;
use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::engine::state::InboxState;
use crate::inbox::index::merger::MergeOutcome;
use crate::inbox::ingest::wire::RawMessage;

/// Shared handle to the session state.
pub type SharedInbox = Arc<Mutex<InboxState>>;

/// Counters from a session run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Messages merged into state.
    pub merged: usize,
    /// Repeated deliveries ignored.
    pub duplicates: usize,
    /// Messages rejected (malformed or unknown conversation).
    pub rejected: usize,
}

impl SessionStats {
    fn record(&mut self, result: &InboxResult<MergeOutcome>) {
        match result {
            Ok(outcome) if outcome.changed() => self.merged += 1,
            Ok(_) => self.duplicates += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

/// Fetch the snapshot and build the initial state.
///
/// An empty snapshot is not fatal: the session starts with an empty inbox.
///
/// # Errors
/// Returns an error if the fetch fails or a record is malformed.
pub async fn bootstrap_state(
    config: InboxConfig,
    source: &dyn SnapshotSource,
) -> InboxResult<InboxState> {
    let raw = source.fetch_conversations().await?;
    match InboxState::load_raw_snapshot(config.clone(), raw) {
        Err(InboxError::EmptySnapshot) => {
            warn!("Snapshot is empty, starting with an empty inbox");
            Ok(InboxState::empty(config))
        }
        other => other,
    }
}

/// Applies streamed notifications to shared inbox state.
pub struct InboxSession {
    state: SharedInbox,
    feed: Arc<dyn NotificationFeed>,
    shutdown: Arc<Notify>,
}

impl InboxSession {
    /// Create a session over existing state.
    #[must_use]
    pub fn new(state: SharedInbox, feed: Arc<dyn NotificationFeed>) -> Self {
        Self {
            state,
            feed,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Shared state handle.
    #[must_use]
    pub fn state(&self) -> SharedInbox {
        Arc::clone(&self.state)
    }

    /// Notifier that stops the session loop.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the session loop as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<InboxResult<SessionStats>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Subscribe and apply notifications until the feed ends or shutdown is
    /// signaled.
    ///
    /// # Errors
    /// Returns an error if the subscription cannot be established.
    pub async fn run(&self) -> InboxResult<SessionStats> {
        let subscription = self.state.lock().await.subscription();
        let mut stream = self.feed.subscribe(subscription).await?;
        let mut stats = SessionStats::default();

        loop {
            tokio::select! {
                next = stream.next() => {
                    let Some(raw) = next else {
                        info!("Notification feed closed");
                        break;
                    };
                    let result = self.apply(raw).await;
                    stats.record(&result);
                }
                () = self.shutdown.notified() => {
                    info!("Inbox session shutting down");
                    break;
                }
            }
        }

        info!(
            merged = stats.merged,
            duplicates = stats.duplicates,
            rejected = stats.rejected,
            "Inbox session finished"
        );
        Ok(stats)
    }

    /// Apply one streamed record.
    ///
    /// # Errors
    /// Returns the validation or merge error; state is unchanged in that case.
    pub async fn apply(&self, raw: RawMessage) -> InboxResult<MergeOutcome> {
        let result = self.state.lock().await.merge_raw(raw);
        match &result {
            Ok(outcome) => debug!(?outcome, "Applied notification"),
            Err(err) => warn!(%err, "Dropped notification"),
        }
        result
    }
}
