//! Display formatting for the conversation list and threads.

pub mod relative_time;
pub mod views;

pub use relative_time::{UNKNOWN_AGE, format_relative};
pub use views::{ConversationRow, MessageView, conversation_row, thread_view};
