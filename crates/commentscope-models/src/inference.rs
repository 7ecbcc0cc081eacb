//! Inference adapter traits
//!
//! Each model slot in the registry holds one of these trait objects, so the
//! request handler never depends on a concrete backend. Candle-backed
//! implementations live in [`crate::sequence`], [`crate::embedding`] and
//! [`crate::regressor`]; tests substitute their own.

use async_trait::async_trait;
use commentscope_core::Result;

/// Sequence classifier producing a single class index per text
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classify the text and return the argmax class index
    async fn classify(&self, text: &str) -> Result<usize>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Feature extractor producing one fixed-width vector per text
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed the text; the returned vector may be treated as a single feature row
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Width of the produced vector, if known ahead of time
    fn dimension(&self) -> Option<usize>;
}

/// Raw output of a regressor for one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPrediction {
    /// Model emits class indices directly
    Class(i64),
    /// Model emits a continuous value
    Value(f64),
}

impl RawPrediction {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Class(c) => *c as f64,
            Self::Value(v) => *v,
        }
    }
}

/// Tabular model consuming feature rows
pub trait Regressor: Send + Sync {
    /// Predict one output per row
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<RawPrediction>>;

    /// Human-readable model type, reported by the health and debug endpoints
    fn descriptor(&self) -> String;

    /// Whether the model can serve `predict` calls
    fn supports_predict(&self) -> bool {
        true
    }
}
