//! Static class-index to label mappings for each prediction category

/// Label returned for a class index outside the taxonomy
pub const UNKNOWN_LABEL: &str = "unknown";

/// Fixed mapping from class index to human-readable label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMap {
    labels: &'static [&'static str],
}

impl LabelMap {
    /// Create a label map; index `i` maps to `labels[i]`
    pub const fn new(labels: &'static [&'static str]) -> Self {
        Self { labels }
    }

    /// Look up a label, returning `None` for an unknown index
    pub fn get(&self, index: usize) -> Option<&'static str> {
        self.labels.get(index).copied()
    }

    /// Look up a label, falling back to `"unknown"`
    pub fn label(&self, index: usize) -> &'static str {
        self.get(index).unwrap_or(UNKNOWN_LABEL)
    }

    /// Number of classes in the taxonomy
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels in index order
    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }
}

pub const EMOTION_LABELS: LabelMap = LabelMap::new(&[
    "joy", "sadness", "anger", "fear", "disgust", "surprise", "neutral",
]);

pub const SENTIMENT_LABELS: LabelMap = LabelMap::new(&["positive", "negative", "neutral"]);

pub const LIKE_COUNT_LABELS: LabelMap = LabelMap::new(&["low", "medium", "high", "viral"]);
