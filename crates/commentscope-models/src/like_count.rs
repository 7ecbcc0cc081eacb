//! Like-count prediction: BERT embedding followed by a tree regressor

use crate::inference::{RawPrediction, Regressor, TextEmbedder};
use commentscope_core::{Error, Result};
use std::sync::Arc;
use std::time::Instant;

/// Number of like-count buckets (low, medium, high, viral)
pub const LIKE_COUNT_BUCKETS: usize = 4;

/// Map a raw regression value to a like-count bucket
///
/// Values strictly between 500 and 501, and NaN, fall through to the top
/// bucket.
pub fn regression_to_bucket(value: f64) -> usize {
    if value < 100.0 {
        0
    } else if (100.0..=500.0).contains(&value) {
        1
    } else if (501.0..=1500.0).contains(&value) {
        2
    } else {
        3
    }
}

/// Bucket a raw regressor output
///
/// Class outputs inside the bucket range are used as-is; anything else goes
/// through [`regression_to_bucket`].
pub fn resolve_bucket(prediction: RawPrediction) -> usize {
    match prediction {
        RawPrediction::Class(class) if (0..LIKE_COUNT_BUCKETS as i64).contains(&class) => {
            class as usize
        }
        other => regression_to_bucket(other.as_f64()),
    }
}

/// Embedding model and regressor paired into a bucket predictor
#[derive(Clone)]
pub struct LikeCountPredictor {
    embedder: Arc<dyn TextEmbedder>,
    regressor: Arc<dyn Regressor>,
}

impl LikeCountPredictor {
    pub fn new(embedder: Arc<dyn TextEmbedder>, regressor: Arc<dyn Regressor>) -> Self {
        Self {
            embedder,
            regressor,
        }
    }

    /// Predict the like-count bucket index for a text
    pub async fn predict(&self, text: &str) -> Result<usize> {
        let start = Instant::now();

        let embedding = self.embedder.embed(text).await?;
        if embedding.is_empty() {
            return Err(Error::inference("Embedding model returned an empty vector"));
        }

        let rows = vec![embedding];
        let raw = self
            .regressor
            .predict(&rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::inference("Regressor returned no predictions"))?;

        let bucket = resolve_bucket(raw);

        tracing::debug!(
            features = rows[0].len(),
            raw_prediction = raw.as_f64(),
            bucket,
            latency_us = start.elapsed().as_micros() as u64,
            "Like-count prediction"
        );

        Ok(bucket)
    }

    /// Descriptor of the underlying regressor
    pub fn regressor_descriptor(&self) -> String {
        self.regressor.descriptor()
    }
}
