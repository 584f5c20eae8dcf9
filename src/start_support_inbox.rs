//! Startup helpers for the support inbox server.
//!
//! Collaborators are picked from configuration: a local JSON snapshot, the
//! upstream API, or an empty inbox. Without an upstream API, sent messages are
//! echoed back through the local notification feed.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use crate::inbox::collaborators::message_sender::{
    HttpMessageSender, MessageSender, RecordingSender,
};
use crate::inbox::collaborators::notification_feed::ChannelFeed;
use crate::inbox::collaborators::snapshot_source::{
    HttpSnapshotSource, InMemorySnapshotSource, SnapshotSource,
};
use crate::inbox::core::config::InboxConfig;
use crate::inbox::session::driver::{InboxSession, bootstrap_state};
use crate::server::{self, AppState};

/// Capacity of the local notification channel.
const FEED_CAPACITY: usize = 256;

/// Run the server (used by the `support-inbox-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting support inbox v{}", env!("CARGO_PKG_VERSION"));

    let config = match InboxConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(config, get_port())) {
        tracing::error!("Server error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Pick the snapshot source for `config`.
///
/// # Errors
/// Returns an error if the snapshot file or API URL is unusable.
pub fn snapshot_source(
    config: &InboxConfig,
    client: &reqwest::Client,
) -> anyhow::Result<Box<dyn SnapshotSource>> {
    if let Some(path) = &config.snapshot_path {
        let source = InMemorySnapshotSource::from_json_file(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        return Ok(Box::new(source));
    }
    if let Some(base_url) = &config.api_base_url {
        return Ok(Box::new(HttpSnapshotSource::new(client.clone(), base_url)?));
    }
    tracing::warn!("No snapshot source configured, starting empty");
    Ok(Box::new(InMemorySnapshotSource::default()))
}

/// Bootstrap the inbox, start the notification session and serve HTTP until
/// Ctrl+C.
///
/// # Errors
/// Returns an error if bootstrap or the server fails.
pub async fn serve(config: InboxConfig, port: u16) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let source = snapshot_source(&config, &client)?;
    let (feed, publisher) = ChannelFeed::new(FEED_CAPACITY);

    let sender: Arc<dyn MessageSender> = match &config.api_base_url {
        Some(base_url) => Arc::new(HttpMessageSender::new(client, base_url)?),
        None => Arc::new(RecordingSender::with_echo(publisher.clone())),
    };

    let state = bootstrap_state(config, &*source)
        .await
        .context("loading conversation snapshot")?;
    let inbox = Arc::new(Mutex::new(state));

    let session = InboxSession::new(Arc::clone(&inbox), Arc::new(feed));
    let session_shutdown = session.shutdown_notifier();
    let session_handle = session.spawn();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    };

    let served = server::run_server_with_shutdown(AppState::new(inbox, sender), port, shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e));

    drop(publisher);
    session_shutdown.notify_one();
    match session_handle.await {
        Ok(Ok(stats)) => tracing::info!(?stats, "Notification session stopped"),
        Ok(Err(e)) => tracing::warn!("Notification session failed: {e}"),
        Err(e) => tracing::warn!("Notification session panicked: {e}"),
    }

    served
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var("INBOX_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}
