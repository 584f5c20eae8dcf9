//! Identifier types for the support inbox.
//!
//! Conversations, messages, customers and accounts are identified by UUIDs
//! issued upstream. Each one gets its own newtype so a message id can never be
//! passed where a conversation id is expected.
//!
//! Agent user ids are opaque strings (the upstream service uses integer keys),
//! wrapped in [`UserId`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate an ID with good insert locality.
///
/// With feature `uuid_v7` enabled, this uses `Uuid::now_v7()`.
/// Otherwise it falls back to `Uuid::new_v4()`.
#[inline]
#[must_use]
fn uuid_time_ordered() -> Uuid {
    #[cfg(feature = "uuid_v7")]
    {
        Uuid::now_v7()
    }
    #[cfg(not(feature = "uuid_v7"))]
    {
        Uuid::new_v4()
    }
}

/// Generate a random UUID (v4).
#[inline]
#[must_use]
fn uuid_random() -> Uuid {
    Uuid::new_v4()
}

/// Declare a UUID newtype with a consistent API.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident,
        generator = $gen:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            /// Create a new identifier.
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self($gen())
            }

            /// Wrap an existing UUID.
            #[inline]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Borrow the underlying UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_uuid_id!(
    /// Support account (tenant) identifier.
    ///
    /// Scopes the notification topic.
    AccountId,
    generator = uuid_random
);

define_uuid_id!(
    /// Identifier for a conversation thread.
    ConversationId,
    generator = uuid_time_ordered
);

define_uuid_id!(
    /// Identifier for a single message.
    MessageId,
    generator = uuid_time_ordered
);

define_uuid_id!(
    /// Identifier of the customer who wrote a message.
    CustomerId,
    generator = uuid_random
);

/// Errors returned when parsing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    /// Empty (or whitespace-only) identifier.
    Empty,
    /// Exceeds the maximum accepted length.
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        got: usize,
    },
}

impl fmt::Display for UserIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "user id must not be empty"),
            Self::TooLong { max, got } => write!(f, "user id too long: got {got}, max {max}"),
        }
    }
}

impl std::error::Error for UserIdError {}

/// Identifier of the agent using the inbox.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Hard ceiling to prevent pathological payloads.
    pub const MAX_LEN: usize = 64;

    /// Build a validated `UserId`.
    ///
    /// # Errors
    /// Returns `UserIdError` if the input is empty or too long.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserIdError> {
        let s = raw.as_ref().trim();

        if s.is_empty() {
            return Err(UserIdError::Empty);
        }
        if s.len() > Self::MAX_LEN {
            return Err(UserIdError::TooLong {
                max: Self::MAX_LEN,
                got: s.len(),
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self("1".to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
