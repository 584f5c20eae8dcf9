//! Indexing, ranking and merging of conversations.

pub mod indexer;
pub mod merger;
pub mod ranker;

pub use indexer::{ConversationIndex, index_conversations};
pub use merger::{MergeOutcome, merge_message};
pub use ranker::{RankOrder, rank_conversations, rank_key};
