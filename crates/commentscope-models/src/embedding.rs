//! BERT feature extractor feeding the like-count regressor
//!
//! The representation of a text is the final hidden state of its first
//! (`[CLS]`) token.

use crate::inference::TextEmbedder;
use crate::model_loader::{
    configure_tokenizer, load_tokenizer, load_var_builder, parse_json_config, BundleMetadata,
};
use crate::sequence::{cls_token, load_bert_backbone, row_tensor};
use async_trait::async_trait;
use candle_core::Device;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use commentscope_core::{Error, Result};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;

/// BERT encoder producing `[CLS]` embeddings
pub struct BertEmbedder {
    tokenizer: Tokenizer,
    model: BertModel,
    device: Device,
    hidden_size: usize,
}

impl BertEmbedder {
    /// Load the encoder and its tokenizer from a bundle
    pub fn load(bundle: &Path, device: &Device) -> Result<Self> {
        let metadata = BundleMetadata::from_bundle(bundle)?;
        let hidden_size = metadata.hidden_size;
        let config: BertConfig = parse_json_config(&bundle.join("config.json"))?;

        let mut tokenizer = load_tokenizer(bundle)?;
        configure_tokenizer(&mut tokenizer, metadata.max_sequence_length(bundle))?;

        let vb = load_var_builder(bundle, device)?;
        let model = load_bert_backbone(&vb, &config)?;

        tracing::info!(
            "Loaded BERT embedding model from {} (hidden_size={})",
            bundle.display(),
            hidden_size
        );

        Ok(Self {
            tokenizer,
            model,
            device: device.clone(),
            hidden_size,
        })
    }
}

#[async_trait]
impl TextEmbedder for BertEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::inference(format!("Tokenization failed: {}", e)))?;

        let input_ids = row_tensor(encoding.get_ids(), &self.device)?;
        let token_type_ids = row_tensor(encoding.get_type_ids(), &self.device)?;
        let attention_mask = row_tensor(encoding.get_attention_mask(), &self.device)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

        let embedding = cls_token(&hidden_states)?
            .flatten_all()
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| Error::inference(format!("Failed to convert embedding: {}", e)))?;

        tracing::debug!(
            tokens = encoding.get_ids().len(),
            dim = embedding.len(),
            sample = ?&embedding[..embedding.len().min(5)],
            latency_us = start.elapsed().as_micros() as u64,
            "Extracted CLS embedding"
        );

        Ok(embedding)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.hidden_size)
    }
}
