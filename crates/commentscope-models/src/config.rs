//! Model bundle locations

use crate::model_loader::DeviceType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the regressor inside the like-count bundle
pub const REGRESSOR_FILE_NAME: &str = "xgboost_BERT_embeddings.json";

/// Paths of the three model bundles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Emotion classifier bundle
    #[serde(default = "default_emotion_dir")]
    pub emotion_dir: PathBuf,

    /// Sentiment classifier bundle
    #[serde(default = "default_sentiment_dir")]
    pub sentiment_dir: PathBuf,

    /// Embedding model bundle used for like-count prediction
    #[serde(default = "default_like_count_dir")]
    pub like_count_dir: PathBuf,

    /// XGBoost JSON regressor
    #[serde(default = "default_regressor_file")]
    pub regressor_file: PathBuf,

    /// Inference device
    #[serde(default)]
    pub device: DeviceType,
}

impl ModelsConfig {
    /// Default layout rooted at `models_dir`
    pub fn rooted_at(models_dir: impl AsRef<Path>) -> Self {
        let root = models_dir.as_ref();
        let like_count_dir = root.join("model_predict");
        Self {
            emotion_dir: root.join("model_emotion"),
            sentiment_dir: root.join("model_sentiment"),
            regressor_file: like_count_dir.join(REGRESSOR_FILE_NAME),
            like_count_dir,
            device: DeviceType::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self::rooted_at("./models")
    }
}

fn default_emotion_dir() -> PathBuf {
    ModelsConfig::default().emotion_dir
}

fn default_sentiment_dir() -> PathBuf {
    ModelsConfig::default().sentiment_dir
}

fn default_like_count_dir() -> PathBuf {
    ModelsConfig::default().like_count_dir
}

fn default_regressor_file() -> PathBuf {
    ModelsConfig::default().regressor_file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = ModelsConfig::default();
        assert_eq!(config.emotion_dir, PathBuf::from("./models/model_emotion"));
        assert_eq!(config.sentiment_dir, PathBuf::from("./models/model_sentiment"));
        assert_eq!(config.like_count_dir, PathBuf::from("./models/model_predict"));
        assert_eq!(
            config.regressor_file,
            PathBuf::from("./models/model_predict/xgboost_BERT_embeddings.json")
        );
        assert_eq!(config.device, DeviceType::Cpu);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: ModelsConfig =
            serde_json::from_str(r#"{"emotion_dir": "/opt/emotion", "device": "cuda:1"}"#).unwrap();
        assert_eq!(config.emotion_dir, PathBuf::from("/opt/emotion"));
        assert_eq!(config.sentiment_dir, PathBuf::from("./models/model_sentiment"));
        assert_eq!(config.device, DeviceType::Cuda(1));
    }
}
