//! Per-category label counts over the history log

use crate::entry::HistoryEntry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregated label frequencies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total_predictions: usize,
    pub emotion_stats: BTreeMap<String, usize>,
    pub sentiment_stats: BTreeMap<String, usize>,
    pub like_count_stats: BTreeMap<String, usize>,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut stats = Self {
            total_predictions: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            *stats.emotion_stats.entry(entry.emotion.clone()).or_default() += 1;
            *stats.sentiment_stats.entry(entry.sentiment.clone()).or_default() += 1;
            *stats.like_count_stats.entry(entry.like_count.clone()).or_default() += 1;
        }

        stats
    }
}
