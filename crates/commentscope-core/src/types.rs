//! Prediction categories and per-field outcomes

use crate::labels::{LabelMap, EMOTION_LABELS, LIKE_COUNT_LABELS, SENTIMENT_LABELS, UNKNOWN_LABEL};
use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel written when a model failed during inference
pub const ERROR_SENTINEL: &str = "error";

/// Sentinel written when a model bundle is not loaded
pub const MODEL_NOT_LOADED_SENTINEL: &str = "model_not_loaded";

/// The three independent prediction categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Emotion,
    Sentiment,
    LikeCount,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Emotion, Category::Sentiment, Category::LikeCount];

    /// Label map for this category
    pub fn labels(&self) -> &'static LabelMap {
        match self {
            Self::Emotion => &EMOTION_LABELS,
            Self::Sentiment => &SENTIMENT_LABELS,
            Self::LikeCount => &LIKE_COUNT_LABELS,
        }
    }

    /// Field name used in responses and history entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emotion => "emotion",
            Self::Sentiment => "sentiment",
            Self::LikeCount => "like_count",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one prediction field
///
/// Serializes as a bare string: the label itself, or one of the
/// `"unknown"`, `"error"`, `"model_not_loaded"` sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Model produced an index present in the taxonomy
    Label(&'static str),
    /// Model produced an index outside the taxonomy
    Unknown,
    /// Model is loaded but inference failed
    Error,
    /// Model bundle is not loaded
    ModelNotLoaded,
}

impl FieldOutcome {
    /// Map a class index through a label map
    pub fn from_index(labels: &LabelMap, index: usize) -> Self {
        match labels.get(index) {
            Some(label) => Self::Label(label),
            None => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Label(label) => label,
            Self::Unknown => UNKNOWN_LABEL,
            Self::Error => ERROR_SENTINEL,
            Self::ModelNotLoaded => MODEL_NOT_LOADED_SENTINEL,
        }
    }

    /// Short outcome kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Label(_) => "label",
            Self::Unknown => UNKNOWN_LABEL,
            Self::Error => ERROR_SENTINEL,
            Self::ModelNotLoaded => MODEL_NOT_LOADED_SENTINEL,
        }
    }
}

impl fmt::Display for FieldOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
