//! Error types for CommentScope

/// Result type alias using CommentScope's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CommentScope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model bundle could not be located or loaded
    #[error("model error: {0}")]
    Model(String),

    /// Tokenization, forward pass or regression failed
    #[error("inference error: {0}")]
    Inference(String),

    /// History file could not be written
    #[error("history error: {0}")]
    History(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new history error
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
