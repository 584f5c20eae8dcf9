//! Configuration for the support inbox.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::inbox::core::errors::{InboxError, InboxResult};
use crate::inbox::core::ids::{AccountId, UserId};

/// What to do with a message for a conversation the index has never seen.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownConversationPolicy {
    /// Report `UnknownConversation` and leave state untouched.
    #[default]
    Reject,
    /// Open a fresh conversation holding the message.
    Create,
}

impl std::str::FromStr for UnknownConversationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "reject" => Ok(Self::Reject),
            "create" => Ok(Self::Create),
            other => Err(other.to_string()),
        }
    }
}

/// Top-level configuration for an inbox session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboxConfig {
    /// Support account the session belongs to.
    pub account_id: AccountId,
    /// Agent writing outbound messages.
    pub user_id: UserId,
    /// Upstream API base URL for the HTTP collaborators.
    pub api_base_url: Option<String>,
    /// Local JSON snapshot used instead of the upstream API.
    pub snapshot_path: Option<PathBuf>,
    /// Handling of messages for unknown conversations.
    pub unknown_conversations: UnknownConversationPolicy,
    /// Customer label when the upstream record has none.
    pub default_customer: String,
    /// Preview text for conversations without messages.
    pub preview_placeholder: String,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            account_id: AccountId::new(),
            user_id: UserId::default(),
            api_base_url: None,
            snapshot_path: None,
            unknown_conversations: UnknownConversationPolicy::Reject,
            default_customer: "Anonymous User".to_string(),
            preview_placeholder: "...".to_string(),
        }
    }
}

impl InboxConfig {
    /// Apply `INBOX_*` environment overrides on top of the defaults.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> InboxResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    ///
    /// Without `INBOX_ACCOUNT_ID` a random account is used, which only makes
    /// sense for a local session.
    ///
    /// # Errors
    /// Returns an error if a value is unparseable, or if an upstream API is
    /// configured without an account id.
    pub fn from_lookup<F>(lookup: F) -> InboxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("INBOX_ACCOUNT_ID") {
            config.account_id = raw.parse().map_err(|err| {
                InboxError::InvalidConfig(format!("INBOX_ACCOUNT_ID: {err}"))
            })?;
        }
        if let Some(raw) = lookup("INBOX_USER_ID") {
            config.user_id = UserId::new(&raw)
                .map_err(|err| InboxError::InvalidConfig(format!("INBOX_USER_ID: {err}")))?;
        }
        if let Some(raw) = lookup("INBOX_API_BASE_URL") {
            config.api_base_url = Some(raw);
        }
        if let Some(raw) = lookup("INBOX_SNAPSHOT_PATH") {
            config.snapshot_path = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("INBOX_UNKNOWN_CONVERSATIONS") {
            config.unknown_conversations = raw.parse().map_err(|value| {
                InboxError::InvalidConfig(format!(
                    "INBOX_UNKNOWN_CONVERSATIONS must be reject or create, got {value:?}"
                ))
            })?;
        }

        config.validate()?;

        if lookup("INBOX_ACCOUNT_ID").is_none() {
            if config.api_base_url.is_some() {
                return Err(InboxError::InvalidConfig(
                    "INBOX_ACCOUNT_ID is required with INBOX_API_BASE_URL".to_string(),
                ));
            }
            warn!(
                account_id = %config.account_id,
                "INBOX_ACCOUNT_ID not set, using a random local account"
            );
        }

        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are invalid.
    pub fn validate(&self) -> InboxResult<()> {
        if self.default_customer.trim().is_empty() {
            return Err(InboxError::InvalidConfig(
                "default_customer must not be empty".to_string(),
            ));
        }

        if let Some(base_url) = &self.api_base_url {
            let url = Url::parse(base_url)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(InboxError::InvalidConfig(format!(
                    "api_base_url must be http(s), got {}",
                    url.scheme()
                )));
            }
        }

        Ok(())
    }

    /// Notification topic scoped to this account.
    #[must_use]
    pub fn notification_topic(&self) -> String {
        format!("notification:{}", self.account_id)
    }
}
