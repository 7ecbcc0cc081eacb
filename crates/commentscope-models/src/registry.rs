//! Model registry
//!
//! Holds the emotion and sentiment classifiers, the embedding model and the
//! like-count regressor. Loading is best-effort: a missing or broken bundle
//! leaves its slot unloaded and never aborts startup. The registry is
//! immutable once built and shared behind an `Arc`.

use crate::config::ModelsConfig;
use crate::embedding::BertEmbedder;
use crate::inference::{Regressor, TextClassifier, TextEmbedder};
use crate::like_count::LikeCountPredictor;
use crate::model_loader::create_device;
use crate::regressor::XgbRegressor;
use crate::sequence::SequenceClassifier;
use commentscope_core::{Category, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Load state of one model
pub enum ModelSlot<T: ?Sized> {
    /// Model is ready for inference
    Loaded(Arc<T>),
    /// Bundle exists but could not be loaded
    Failed { reason: String },
    /// Bundle path does not exist
    Missing,
}

impl<T: ?Sized> ModelSlot<T> {
    pub fn get(&self) -> Option<&Arc<T>> {
        match self {
            Self::Loaded(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Failure reason, if loading was attempted and failed
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    fn state(&self) -> &'static str {
        match self {
            Self::Loaded(_) => "loaded",
            Self::Failed { .. } => "failed",
            Self::Missing => "missing",
        }
    }

    /// Probe `path`, then run `loader` only if it exists
    fn probe(name: &str, path: &Path, loader: impl FnOnce() -> Result<Arc<T>>) -> Self {
        if !path.exists() {
            warn!("{} model not found at {}", name, path.display());
            return Self::Missing;
        }

        match loader() {
            Ok(model) => {
                info!("✓ Loaded {} model from {}", name, path.display());
                Self::Loaded(model)
            }
            Err(e) => {
                warn!("✗ Failed to load {} model from {}: {}", name, path.display(), e);
                Self::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl<T: ?Sized> Clone for ModelSlot<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Loaded(model) => Self::Loaded(Arc::clone(model)),
            Self::Failed { reason } => Self::Failed {
                reason: reason.clone(),
            },
            Self::Missing => Self::Missing,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for ModelSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "Failed({})", reason),
            other => f.write_str(other.state()),
        }
    }
}

/// Extra status fields reported for the like-count model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressorStatus {
    pub xgboost_exists: bool,
    pub bert_loaded: bool,
    pub xgboost_loaded: bool,
    pub xgboost_path: String,
    pub xgboost_type: Option<String>,
}

/// Status of one model, derived fresh on each query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub path: String,
    pub exists: bool,
    #[serde(flatten)]
    pub regressor: Option<RegressorStatus>,
}

/// Immutable set of loaded models
pub struct ModelRegistry {
    config: ModelsConfig,
    emotion: ModelSlot<dyn TextClassifier>,
    sentiment: ModelSlot<dyn TextClassifier>,
    embedder: ModelSlot<dyn TextEmbedder>,
    regressor: ModelSlot<dyn Regressor>,
}

impl ModelRegistry {
    /// Load every configured bundle
    ///
    /// Never fails; unavailable models are left unloaded and logged.
    pub fn load(config: ModelsConfig) -> Self {
        info!("Loading models (device: {})", config.device);
        let device = create_device(config.device);

        let emotion = ModelSlot::probe("emotion", &config.emotion_dir, || {
            let model = SequenceClassifier::load(
                "emotion",
                &config.emotion_dir,
                Category::Emotion.labels().len(),
                &device,
            )?;
            Ok(Arc::new(model) as Arc<dyn TextClassifier>)
        });

        let sentiment = ModelSlot::probe("sentiment", &config.sentiment_dir, || {
            let model = SequenceClassifier::load(
                "sentiment",
                &config.sentiment_dir,
                Category::Sentiment.labels().len(),
                &device,
            )?;
            Ok(Arc::new(model) as Arc<dyn TextClassifier>)
        });

        let embedder = ModelSlot::probe("embedding", &config.like_count_dir, || {
            let model = BertEmbedder::load(&config.like_count_dir, &device)?;
            Ok(Arc::new(model) as Arc<dyn TextEmbedder>)
        });

        let regressor = ModelSlot::probe("xgboost", &config.regressor_file, || {
            let model = XgbRegressor::from_file(&config.regressor_file)?;
            Ok(Arc::new(model) as Arc<dyn Regressor>)
        });

        let registry = Self {
            config,
            emotion,
            sentiment,
            embedder,
            regressor,
        };
        registry.log_summary();
        registry
    }

    /// Assemble a registry from in-memory adapters
    pub fn builder(config: ModelsConfig) -> ModelRegistryBuilder {
        ModelRegistryBuilder::new(config)
    }

    fn log_summary(&self) {
        info!(
            emotion = self.emotion.state(),
            sentiment = self.sentiment.state(),
            embedding = self.embedder.state(),
            xgboost = self.regressor.state(),
            "Model registry initialized"
        );
        if !self.all_loaded() {
            warn!("Some models are not loaded; affected fields will report model_not_loaded");
        }
    }

    pub fn config(&self) -> &ModelsConfig {
        &self.config
    }

    /// Classifier for emotion or sentiment; `None` when unloaded or for like-count
    pub fn classifier(&self, category: Category) -> Option<Arc<dyn TextClassifier>> {
        let slot = match category {
            Category::Emotion => &self.emotion,
            Category::Sentiment => &self.sentiment,
            Category::LikeCount => return None,
        };
        slot.get().cloned()
    }

    /// Embedding model paired with the regressor, if both are loaded
    pub fn like_count_predictor(&self) -> Option<LikeCountPredictor> {
        let embedder = self.embedder.get()?;
        let regressor = self.regressor.get()?;
        Some(LikeCountPredictor::new(
            Arc::clone(embedder),
            Arc::clone(regressor),
        ))
    }

    pub fn is_loaded(&self, category: Category) -> bool {
        match category {
            Category::Emotion => self.emotion.is_loaded(),
            Category::Sentiment => self.sentiment.is_loaded(),
            Category::LikeCount => self.embedder.is_loaded() && self.regressor.is_loaded(),
        }
    }

    pub fn all_loaded(&self) -> bool {
        Category::ALL.iter().all(|&category| self.is_loaded(category))
    }

    pub fn embedder_loaded(&self) -> bool {
        self.embedder.is_loaded()
    }

    pub fn regressor_loaded(&self) -> bool {
        self.regressor.is_loaded()
    }

    /// Type descriptor of the loaded regressor
    pub fn regressor_descriptor(&self) -> Option<String> {
        self.regressor.get().map(|r| r.descriptor())
    }

    /// Whether the loaded regressor can serve predictions
    pub fn regressor_supports_predict(&self) -> Option<bool> {
        self.regressor.get().map(|r| r.supports_predict())
    }

    /// Bundle path for a category
    pub fn path(&self, category: Category) -> &Path {
        match category {
            Category::Emotion => &self.config.emotion_dir,
            Category::Sentiment => &self.config.sentiment_dir,
            Category::LikeCount => &self.config.like_count_dir,
        }
    }

    /// Current status of a model
    pub fn status(&self, category: Category) -> ModelStatus {
        let path = self.path(category);
        let regressor = match category {
            Category::LikeCount => Some(RegressorStatus {
                xgboost_exists: self.config.regressor_file.exists(),
                bert_loaded: self.embedder_loaded(),
                xgboost_loaded: self.regressor_loaded(),
                xgboost_path: self.config.regressor_file.display().to_string(),
                xgboost_type: self.regressor_descriptor(),
            }),
            _ => None,
        };

        ModelStatus {
            loaded: self.is_loaded(category),
            path: path.display().to_string(),
            exists: path.exists(),
            regressor,
        }
    }

    /// File names inside the like-count bundle, if the directory exists
    pub fn like_count_dir_listing(&self) -> Option<Vec<String>> {
        let entries = std::fs::read_dir(&self.config.like_count_dir).ok()?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Some(names)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("emotion", &self.emotion)
            .field("sentiment", &self.sentiment)
            .field("embedder", &self.embedder)
            .field("regressor", &self.regressor)
            .finish()
    }
}

/// Builder for registries backed by caller-supplied adapters
pub struct ModelRegistryBuilder {
    config: ModelsConfig,
    emotion: ModelSlot<dyn TextClassifier>,
    sentiment: ModelSlot<dyn TextClassifier>,
    embedder: ModelSlot<dyn TextEmbedder>,
    regressor: ModelSlot<dyn Regressor>,
}

impl ModelRegistryBuilder {
    pub fn new(config: ModelsConfig) -> Self {
        Self {
            config,
            emotion: ModelSlot::Missing,
            sentiment: ModelSlot::Missing,
            embedder: ModelSlot::Missing,
            regressor: ModelSlot::Missing,
        }
    }

    pub fn emotion(mut self, classifier: Arc<dyn TextClassifier>) -> Self {
        self.emotion = ModelSlot::Loaded(classifier);
        self
    }

    pub fn sentiment(mut self, classifier: Arc<dyn TextClassifier>) -> Self {
        self.sentiment = ModelSlot::Loaded(classifier);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn TextEmbedder>) -> Self {
        self.embedder = ModelSlot::Loaded(embedder);
        self
    }

    pub fn regressor(mut self, regressor: Arc<dyn Regressor>) -> Self {
        self.regressor = ModelSlot::Loaded(regressor);
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            config: self.config,
            emotion: self.emotion,
            sentiment: self.sentiment,
            embedder: self.embedder,
            regressor: self.regressor,
        }
    }
}
