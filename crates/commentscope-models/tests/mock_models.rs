//! Mock adapters for testing
//!
//! Configurable implementations of the inference traits, used to exercise
//! the registry and like-count predictor without model bundles on disk.

use async_trait::async_trait;
use commentscope_core::{Category, Error, Result};
use commentscope_models::{
    ModelRegistry, ModelsConfig, RawPrediction, Regressor, TextClassifier, TextEmbedder,
    XgbRegressor,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Classifier returning a fixed class index (or failing)
pub struct MockClassifier {
    name: String,
    class_index: usize,
    should_fail: bool,
    call_count: AtomicU32,
}

impl MockClassifier {
    pub fn new(name: &str, class_index: usize) -> Self {
        Self {
            name: name.to_string(),
            class_index,
            should_fail: false,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            should_fail: true,
            ..Self::new(name, 0)
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextClassifier for MockClassifier {
    async fn classify(&self, _text: &str) -> Result<usize> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(Error::inference(format!("{} failed", self.name)));
        }
        Ok(self.class_index)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Embedder returning a constant vector of the given width
pub struct MockEmbedder {
    dim: usize,
}

#[async_trait]
impl TextEmbedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vec![text.chars().count() as f32; self.dim])
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dim)
    }
}

/// Regressor returning a fixed raw value
pub struct MockRegressor(RawPrediction);

impl Regressor for MockRegressor {
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<RawPrediction>> {
        Ok(vec![self.0; rows.len()])
    }

    fn descriptor(&self) -> String {
        "mock.regressor".to_string()
    }
}

fn registry_with_regressor(regressor: Arc<dyn Regressor>) -> ModelRegistry {
    ModelRegistry::builder(ModelsConfig::rooted_at("/nonexistent"))
        .emotion(Arc::new(MockClassifier::new("emotion", 0)))
        .sentiment(Arc::new(MockClassifier::new("sentiment", 2)))
        .embedder(Arc::new(MockEmbedder { dim: 4 }))
        .regressor(regressor)
        .build()
}

#[tokio::test]
async fn test_registry_with_all_mocks_is_healthy() {
    let registry = registry_with_regressor(Arc::new(MockRegressor(RawPrediction::Value(250.0))));

    assert!(registry.all_loaded());
    assert_eq!(registry.regressor_descriptor().as_deref(), Some("mock.regressor"));
    assert_eq!(registry.regressor_supports_predict(), Some(true));

    let emotion = registry.classifier(Category::Emotion).unwrap();
    assert_eq!(emotion.classify("hi").await.unwrap(), 0);
    assert!(registry.classifier(Category::LikeCount).is_none());
}

#[tokio::test]
async fn test_like_count_buckets_through_registry() {
    for (raw, expected) in [(250.0, "medium"), (50.0, "low"), (2000.0, "viral")] {
        let registry = registry_with_regressor(Arc::new(MockRegressor(RawPrediction::Value(raw))));
        let predictor = registry.like_count_predictor().unwrap();
        let bucket = predictor.predict("great video").await.unwrap();
        assert_eq!(Category::LikeCount.labels().label(bucket), expected);
    }
}

#[tokio::test]
async fn test_like_count_requires_both_halves() {
    let registry = ModelRegistry::builder(ModelsConfig::default())
        .embedder(Arc::new(MockEmbedder { dim: 4 }))
        .build();

    assert!(registry.embedder_loaded());
    assert!(!registry.regressor_loaded());
    assert!(!registry.is_loaded(Category::LikeCount));
    assert!(registry.like_count_predictor().is_none());
}

#[tokio::test]
async fn test_real_regressor_with_mock_embedder() {
    let json = r#"{"learner": {
        "gradient_booster": {"name": "gbtree", "model": {"trees": [
            {"left_children": [1, -1, -1], "right_children": [2, -1, -1],
             "split_indices": [0, 0, 0], "split_conditions": [5.0, 20.0, 900.0],
             "default_left": [0, 0, 0]}
        ]}},
        "learner_model_param": {"base_score": "0", "num_feature": "4"},
        "objective": {"name": "reg:squarederror"}
    }}"#;
    let regressor = XgbRegressor::from_json_str(json).unwrap();
    let registry = registry_with_regressor(Arc::new(regressor));
    let predictor = registry.like_count_predictor().unwrap();

    // feature value is the character count of the text
    assert_eq!(predictor.predict("hey").await.unwrap(), 0);
    assert_eq!(predictor.predict("a much longer comment").await.unwrap(), 2);
    assert_eq!(
        predictor.regressor_descriptor(),
        "xgboost.gbtree(reg:squarederror, 1 trees)"
    );
}

#[tokio::test]
async fn test_failing_classifier_counts_calls() {
    let classifier = Arc::new(MockClassifier::failing("sentiment"));
    let registry = ModelRegistry::builder(ModelsConfig::default())
        .sentiment(classifier.clone())
        .build();

    let sentiment = registry.classifier(Category::Sentiment).unwrap();
    assert!(sentiment.classify("meh").await.is_err());
    assert_eq!(classifier.call_count(), 1);
}
