//! CommentScope Models
//!
//! Local inference for the three comment models:
//! - Emotion and sentiment: fine-tuned transformer sequence classifiers
//! - Like count: BERT `[CLS]` embedding fed into an XGBoost regressor
//!
//! All models are loaded once at startup into an immutable [`ModelRegistry`].
//! Missing bundles are tolerated; the corresponding fields report
//! `model_not_loaded`.

pub mod config;
pub mod embedding;
pub mod inference;
pub mod like_count;
pub mod model_loader;
pub mod registry;
pub mod regressor;
pub mod scaffold;
pub mod sequence;

pub use config::{ModelsConfig, REGRESSOR_FILE_NAME};
pub use embedding::BertEmbedder;
pub use inference::{RawPrediction, Regressor, TextClassifier, TextEmbedder};
pub use like_count::{regression_to_bucket, resolve_bucket, LikeCountPredictor};
pub use model_loader::{create_device, DeviceType};
pub use registry::{ModelRegistry, ModelRegistryBuilder, ModelSlot, ModelStatus, RegressorStatus};
pub use regressor::XgbRegressor;
pub use scaffold::{create_model_folders, ScaffoldReport};
pub use sequence::SequenceClassifier;
