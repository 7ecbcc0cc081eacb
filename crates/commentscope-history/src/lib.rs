//! CommentScope History
//!
//! Rolling log of recent predictions, kept newest first in a single
//! pretty-printed JSON file and capped at a fixed number of entries.

pub mod entry;
pub mod stats;
pub mod store;

pub use entry::{display_comment, HistoryEntry, DISPLAY_COMMENT_CHARS};
pub use stats::HistoryStats;
pub use store::{HistoryStore, DEFAULT_HISTORY_LIMIT};
