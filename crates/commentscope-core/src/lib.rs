//! CommentScope Core
//!
//! Core types shared across CommentScope components.
//!
//! This crate provides:
//! - Error types and result handling
//! - Static label maps for the emotion, sentiment and like-count taxonomies
//! - The per-field prediction outcome, including its sentinel values

pub mod error;
pub mod labels;
pub mod types;

pub use error::{Error, Result};
pub use labels::{LabelMap, UNKNOWN_LABEL, EMOTION_LABELS, LIKE_COUNT_LABELS, SENTIMENT_LABELS};
pub use types::{Category, FieldOutcome, ERROR_SENTINEL, MODEL_NOT_LOADED_SENTINEL};

