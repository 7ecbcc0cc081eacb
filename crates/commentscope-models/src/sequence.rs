//! Sequence-classification adapter used for emotion and sentiment
//!
//! Loads a fine-tuned encoder with its classification head from a local
//! bundle and returns the argmax over the output logits.

use crate::inference::TextClassifier;
use crate::model_loader::{
    configure_tokenizer, load_tokenizer, load_var_builder, parse_json_config, BundleMetadata,
};
use async_trait::async_trait;
use candle_core::{Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use candle_transformers::models::xlm_roberta::{
    Config as XlmRobertaConfig, XLMRobertaForSequenceClassification,
};
use commentscope_core::{Error, Result};
use std::path::Path;
use std::time::Instant;
use tokenizers::{Encoding, Tokenizer};

enum Backbone {
    Bert {
        model: BertModel,
        pooler: Option<Linear>,
        classifier: Linear,
    },
    DistilBert {
        model: DistilBertModel,
        pre_classifier: Option<Linear>,
        classifier: Linear,
    },
    XlmRoberta(XLMRobertaForSequenceClassification),
}

impl Backbone {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bert { .. } => "bert",
            Self::DistilBert { .. } => "distilbert",
            Self::XlmRoberta(_) => "xlm-roberta",
        }
    }
}

/// Fine-tuned transformer classifier loaded from a local bundle
pub struct SequenceClassifier {
    name: String,
    tokenizer: Tokenizer,
    backbone: Backbone,
    device: Device,
}

impl SequenceClassifier {
    /// Load a classifier bundle
    ///
    /// `default_num_labels` is used when `config.json` carries neither
    /// `id2label` nor `num_labels`.
    pub fn load(
        name: impl Into<String>,
        bundle: &Path,
        default_num_labels: usize,
        device: &Device,
    ) -> Result<Self> {
        let name = name.into();
        let metadata = BundleMetadata::from_bundle(bundle)?;
        let num_labels = metadata.num_labels.unwrap_or(default_num_labels);

        let mut tokenizer = load_tokenizer(bundle)?;
        configure_tokenizer(&mut tokenizer, metadata.max_sequence_length(bundle))?;

        let vb = load_var_builder(bundle, device)?;
        let config_path = bundle.join("config.json");

        let backbone = match metadata.model_type.as_str() {
            "distilbert" => {
                let config: DistilBertConfig = parse_json_config(&config_path)?;
                let model = DistilBertModel::load(vb.pp("distilbert"), &config).map_err(|e| {
                    Error::model(format!("Failed to load DistilBERT model: {}", e))
                })?;
                let pre_classifier = candle_nn::linear(
                    metadata.hidden_size,
                    metadata.hidden_size,
                    vb.pp("pre_classifier"),
                )
                .ok();
                let classifier = load_classification_head(&vb, metadata.hidden_size, num_labels)?;
                Backbone::DistilBert {
                    model,
                    pre_classifier,
                    classifier,
                }
            }
            "roberta" | "xlm-roberta" => {
                let config: XlmRobertaConfig = parse_json_config(&config_path)?;
                let model = XLMRobertaForSequenceClassification::new(num_labels, &config, vb)
                    .map_err(|e| {
                        Error::model(format!("Failed to load XLM-RoBERTa model: {}", e))
                    })?;
                Backbone::XlmRoberta(model)
            }
            _ => {
                let config: BertConfig = parse_json_config(&config_path)?;
                let model = load_bert_backbone(&vb, &config)?;
                let pooler = candle_nn::linear(
                    metadata.hidden_size,
                    metadata.hidden_size,
                    vb.pp("bert.pooler.dense"),
                )
                .ok();
                let classifier = load_classification_head(&vb, metadata.hidden_size, num_labels)?;
                Backbone::Bert {
                    model,
                    pooler,
                    classifier,
                }
            }
        };

        tracing::info!(
            "Loaded {} classifier '{}' from {} ({} labels)",
            backbone.kind(),
            name,
            bundle.display(),
            num_labels
        );

        Ok(Self {
            name,
            tokenizer,
            backbone,
            device: device.clone(),
        })
    }

    fn logits(&self, encoding: &Encoding) -> Result<Tensor> {
        let input_ids = row_tensor(encoding.get_ids(), &self.device)?;

        match &self.backbone {
            Backbone::Bert {
                model,
                pooler,
                classifier,
            } => {
                let token_type_ids = row_tensor(encoding.get_type_ids(), &self.device)?;
                let attention_mask = row_tensor(encoding.get_attention_mask(), &self.device)?;
                let hidden_states = model
                    .forward(&input_ids, &token_type_ids, Some(&attention_mask))
                    .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

                let cls = cls_token(&hidden_states)?;
                let pooled = match pooler {
                    Some(pooler) => pooler
                        .forward(&cls)
                        .and_then(|t| t.tanh())
                        .map_err(|e| Error::inference(format!("Pooler failed: {}", e)))?,
                    None => cls,
                };
                classifier
                    .forward(&pooled)
                    .map_err(|e| Error::inference(format!("Classification head failed: {}", e)))
            }
            Backbone::DistilBert {
                model,
                pre_classifier,
                classifier,
            } => {
                let input_ids_i64: Vec<i64> =
                    encoding.get_ids().iter().map(|&x| x as i64).collect();
                let input_ids = row_tensor(input_ids_i64.as_slice(), &self.device)?;

                // candle's DistilBERT masks positions where the mask is 1
                let padding_mask: Vec<u8> = encoding
                    .get_attention_mask()
                    .iter()
                    .map(|&x| if x == 0 { 1u8 } else { 0u8 })
                    .collect();
                let padding_mask = row_tensor(padding_mask.as_slice(), &self.device)?;

                let hidden_states = model
                    .forward(&input_ids, &padding_mask)
                    .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

                let cls = cls_token(&hidden_states)?;
                let pooled = match pre_classifier {
                    Some(pre_classifier) => pre_classifier
                        .forward(&cls)
                        .and_then(|t| t.relu())
                        .map_err(|e| Error::inference(format!("Pre-classifier failed: {}", e)))?,
                    None => cls,
                };
                classifier
                    .forward(&pooled)
                    .map_err(|e| Error::inference(format!("Classification head failed: {}", e)))
            }
            Backbone::XlmRoberta(model) => {
                let attention_mask = row_tensor(encoding.get_attention_mask(), &self.device)?;
                let token_type_ids = row_tensor(encoding.get_type_ids(), &self.device)?;
                model
                    .forward(&input_ids, &attention_mask, &token_type_ids)
                    .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))
            }
        }
    }
}

#[async_trait]
impl TextClassifier for SequenceClassifier {
    async fn classify(&self, text: &str) -> Result<usize> {
        let start = Instant::now();

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::inference(format!("Tokenization failed: {}", e)))?;

        let logits = self.logits(&encoding)?;
        let class_index = argmax(&logits)?;

        tracing::debug!(
            classifier = %self.name,
            class_index,
            tokens = encoding.get_ids().len(),
            latency_us = start.elapsed().as_micros() as u64,
            "Classification prediction"
        );

        Ok(class_index)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Argmax over the class dimension of a `[1, num_labels]` logits tensor
pub(crate) fn argmax(logits: &Tensor) -> Result<usize> {
    let index = logits
        .argmax(D::Minus1)
        .and_then(|t| t.flatten_all())
        .and_then(|t| t.to_vec1::<u32>())
        .map_err(|e| Error::inference(format!("Argmax failed: {}", e)))?;

    index
        .first()
        .map(|&idx| idx as usize)
        .ok_or_else(|| Error::inference("Model returned empty logits"))
}

/// Build a `[1, seq_len]` tensor from one encoded sequence
pub(crate) fn row_tensor<T: candle_core::WithDType>(values: &[T], device: &Device) -> Result<Tensor> {
    Tensor::new(values, device)
        .and_then(|t| t.unsqueeze(0))
        .map_err(|e| Error::inference(format!("Failed to create input tensor: {}", e)))
}

/// Hidden state at position 0, shaped `[1, hidden]`
pub(crate) fn cls_token(hidden_states: &Tensor) -> Result<Tensor> {
    hidden_states
        .i((.., 0, ..))
        .map_err(|e| Error::inference(format!("Failed to get CLS token: {}", e)))
}

pub(crate) fn load_bert_backbone(vb: &VarBuilder, config: &BertConfig) -> Result<BertModel> {
    let mut errors = Vec::new();

    for prefix in ["bert", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        match BertModel::load(vb_prefix, config) {
            Ok(model) => {
                let effective_prefix = if prefix.is_empty() { "<root>" } else { prefix };
                tracing::debug!("Loaded BERT backbone from '{}'", effective_prefix);
                return Ok(model);
            }
            Err(e) => {
                errors.push(format!(
                    "{}: {}",
                    if prefix.is_empty() { "<root>" } else { prefix },
                    e
                ));
            }
        }
    }

    Err(Error::model(format!(
        "Failed to load BERT backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

fn load_classification_head(vb: &VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Linear> {
    candle_nn::linear(hidden_size, num_labels, vb.pp("classifier")).map_err(|e| {
        Error::model(format!(
            "No classification head found (hidden_size={}, num_labels={}): {}",
            hidden_size, num_labels, e
        ))
    })
}
