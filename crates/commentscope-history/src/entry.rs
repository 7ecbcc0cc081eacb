//! History entry record

use commentscope_core::UNKNOWN_LABEL;
use serde::{Deserialize, Serialize};

/// Maximum number of characters shown in the `comment` field
pub const DISPLAY_COMMENT_CHARS: usize = 100;

/// Timestamp format: local time, ISO-8601 with microseconds
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One recorded prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,

    #[serde(default)]
    pub timestamp: String,

    /// Display form of the comment, truncated to 100 characters
    #[serde(default)]
    pub comment: String,

    #[serde(default)]
    pub full_comment: String,

    #[serde(default = "unknown_label")]
    pub emotion: String,

    #[serde(default = "unknown_label")]
    pub sentiment: String,

    #[serde(default = "unknown_label")]
    pub like_count: String,
}

impl HistoryEntry {
    /// Build an entry stamped with the current local time
    pub fn new(
        id: u64,
        comment: &str,
        emotion: impl Into<String>,
        sentiment: impl Into<String>,
        like_count: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            comment: display_comment(comment),
            full_comment: comment.to_string(),
            emotion: emotion.into(),
            sentiment: sentiment.into(),
            like_count: like_count.into(),
        }
    }
}

fn unknown_label() -> String {
    UNKNOWN_LABEL.to_string()
}

/// First 100 characters, followed by `...` when the comment is longer
pub fn display_comment(comment: &str) -> String {
    match comment.char_indices().nth(DISPLAY_COMMENT_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &comment[..byte_idx]),
        None => comment.to_string(),
    }
}
