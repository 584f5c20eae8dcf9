//! Session lifecycle.

pub mod driver;

pub use driver::{InboxSession, SessionStats, SharedInbox, bootstrap_state};
