//! Shared loading helpers for on-disk Hugging Face style model bundles
//!
//! A bundle is a directory holding `config.json`, weights
//! (`model.safetensors` or `pytorch_model.bin`) and a tokenizer
//! (`tokenizer.json`, or a WordPiece `vocab.txt`).

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use commentscope_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceType {
    /// CPU inference (always available)
    #[default]
    Cpu,
    /// CUDA GPU inference
    Cuda(usize),
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (kind, index) = match lower.split_once(':') {
            Some((kind, index)) => {
                let index = index
                    .parse::<usize>()
                    .map_err(|_| Error::config(format!("Invalid device index in '{}'", s)))?;
                (kind.to_string(), index)
            }
            None => (lower, 0),
        };

        match kind.as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda(index)),
            "metal" | "mps" => Ok(Self::Metal(index)),
            other => Err(Error::config(format!("Unknown device '{}'", other))),
        }
    }
}

impl TryFrom<String> for DeviceType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{}", idx),
            Self::Metal(idx) => write!(f, "metal:{}", idx),
        }
    }
}

/// Create a Candle device, falling back to CPU when the accelerator is unavailable
pub fn create_device(device_type: DeviceType) -> Device {
    let device = match device_type {
        DeviceType::Cpu => return Device::Cpu,
        DeviceType::Cuda(idx) => Device::new_cuda(idx),
        DeviceType::Metal(idx) => Device::new_metal(idx),
    };

    match device {
        Ok(device) => {
            tracing::info!("Using {} for inference", device_type);
            device
        }
        Err(e) => {
            tracing::warn!("Failed to create {} device, falling back to CPU: {}", device_type, e);
            Device::Cpu
        }
    }
}

/// Fields of `config.json` the adapters need regardless of architecture
#[derive(Debug, Clone, Default)]
pub struct BundleMetadata {
    pub model_type: String,
    pub hidden_size: usize,
    pub max_position_embeddings: usize,
    pub pad_token_id: Option<usize>,
    pub num_labels: Option<usize>,
}

impl BundleMetadata {
    /// Read metadata from `<bundle>/config.json`
    pub fn from_bundle(bundle: &Path) -> Result<Self> {
        let config: serde_json::Value = parse_json_config(&bundle.join("config.json"))?;

        let model_type = config
            .get("model_type")
            .and_then(|v| v.as_str())
            .unwrap_or("bert")
            .to_ascii_lowercase();

        // DistilBERT names its width "dim"
        let hidden_size = config
            .get("hidden_size")
            .or_else(|| config.get("dim"))
            .and_then(|v| v.as_u64())
            .unwrap_or(768) as usize;

        let max_position_embeddings = config
            .get("max_position_embeddings")
            .and_then(|v| v.as_u64())
            .unwrap_or(512) as usize;

        let pad_token_id = config
            .get("pad_token_id")
            .and_then(|v| v.as_u64())
            .map(|id| id as usize);

        let num_labels = config
            .get("id2label")
            .and_then(|v| v.as_object())
            .map(|labels| labels.len())
            .or_else(|| {
                config
                    .get("num_labels")
                    .and_then(|v| v.as_u64())
                    .map(|n| n as usize)
            });

        Ok(Self {
            model_type,
            hidden_size,
            max_position_embeddings,
            pad_token_id,
            num_labels,
        })
    }

    /// Longest token sequence the encoder accepts, special tokens included
    ///
    /// `model_max_length` from `tokenizer_config.json` wins when it is a real
    /// limit. RoBERTa-family position ids start after the padding index, so
    /// `pad_token_id + 1` slots of the position table are never usable.
    pub fn max_sequence_length(&self, bundle: &Path) -> usize {
        let position_limit = match self.model_type.as_str() {
            "roberta" | "xlm-roberta" => {
                let offset = self.pad_token_id.unwrap_or(1) + 1;
                self.max_position_embeddings.saturating_sub(offset)
            }
            _ => self.max_position_embeddings,
        };

        let limit = match tokenizer_model_max_length(bundle) {
            Some(model_max_length) => model_max_length.min(position_limit),
            None => position_limit,
        };
        limit.min(MAX_SEQUENCE_LENGTH)
    }
}

/// Upper bound on tokens fed to any encoder
pub const MAX_SEQUENCE_LENGTH: usize = 512;

/// `model_max_length` from `<bundle>/tokenizer_config.json`
///
/// Tokenizers saved without a limit carry a huge sentinel (about 1e30),
/// which is treated as absent.
fn tokenizer_model_max_length(bundle: &Path) -> Option<usize> {
    let path = bundle.join("tokenizer_config.json");
    if !path.exists() {
        return None;
    }

    let config: serde_json::Value = match parse_json_config(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring unreadable tokenizer config: {}", e);
            return None;
        }
    };

    config
        .get("model_max_length")
        .and_then(|v| v.as_u64())
        .filter(|&n| n > 0 && n <= u32::MAX as u64)
        .map(|n| n as usize)
}

/// Deserialize a JSON config file
pub fn parse_json_config<T: DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::model(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::model(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

/// Open the bundle weights, preferring SafeTensors over PyTorch pickles
pub fn load_var_builder(bundle: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = bundle.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is mmapped and must not be modified while the model is alive.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)
                .map_err(|e| Error::model(format!("Failed to load SafeTensors: {}", e)))?
        };
        return Ok(vb);
    }

    let pytorch = bundle.join("pytorch_model.bin");
    if pytorch.exists() {
        return VarBuilder::from_pth(&pytorch, DType::F32, device)
            .map_err(|e| Error::model(format!("Failed to load PyTorch weights: {}", e)));
    }

    Err(Error::model(format!(
        "No weights found in {} (tried model.safetensors, pytorch_model.bin)",
        bundle.display()
    )))
}

/// Load the bundle tokenizer
pub fn load_tokenizer(bundle: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = bundle.join("tokenizer.json");
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::model(format!("Failed to load tokenizer.json: {}", e)));
    }

    let vocab_path = bundle.join("vocab.txt");
    if vocab_path.exists() {
        tracing::debug!("Building tokenizer from vocab.txt");

        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;

        let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| Error::model(format!("Failed to build WordPiece model: {}", e)))?;

        let cls_id = wordpiece_token_id(&vocab_path, "[CLS]").unwrap_or(101);
        let sep_id = wordpiece_token_id(&vocab_path, "[SEP]").unwrap_or(102);

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
        tokenizer.with_post_processor(Some(BertProcessing::new(
            ("[SEP]".to_string(), sep_id),
            ("[CLS]".to_string(), cls_id),
        )));

        return Ok(tokenizer);
    }

    Err(Error::model(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
        bundle.display()
    )))
}

fn wordpiece_token_id(vocab_path: &Path, token: &str) -> Option<u32> {
    let vocab = std::fs::read_to_string(vocab_path).ok()?;
    vocab
        .lines()
        .position(|line| line == token)
        .map(|idx| idx as u32)
}

/// Enable truncation to `max_length` and longest-sequence padding
pub fn configure_tokenizer(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| Error::model(format!("Failed to configure truncation: {}", e)))?;
    tokenizer.with_padding(Some(PaddingParams::default()));
    Ok(())
}
