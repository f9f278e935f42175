//! Embedding models and tokenizers used to score sentences.
//!
//! The chunking pipeline only sees the [`Embedder`] and [`TokenCounter`]
//! capabilities. The production implementation is a pool of fastembed models
//! ([`EmbeddingPool`]) cached per model identifier by a process-wide
//! [`ModelRegistry`].

mod models;
mod pool;
mod registry;
mod similarity;

use std::sync::Arc;

pub use models::{DEFAULT_MODEL, ResolvedModelName, resolve_model};
pub use pool::EmbeddingPool;
pub use registry::ModelRegistry;
pub use similarity::{cosine_distance, cosine_similarity};

// Re-export key types
pub use fastembed::{EmbeddingModel, TextEmbedding};

/// Error type for embedding and tokenization
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    ModelInitError(String),

    #[error("Failed to generate embedding: {0}")]
    EmbeddingError(String),

    #[error("Failed to tokenize text: {0}")]
    TokenizationError(String),

    #[error("Unknown embedding model '{0}'")]
    UnknownModel(String),

    #[error("Embedder returned {actual} vectors for {expected} inputs")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Maps texts to fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input, in input order, and
/// be deterministic for a fixed model. They are shared across concurrent runs.
pub trait Embedder: Send + Sync {
    /// Identifier reported in run metadata.
    fn model_name(&self) -> &str;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Counts tokens in the vocabulary of an embedding model.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError>;
}

/// An embedder together with the tokenizer of the same model.
#[derive(Clone)]
pub struct SentenceModel {
    pub embedder: Arc<dyn Embedder>,
    pub tokenizer: Arc<dyn TokenCounter>,
}

impl SentenceModel {
    pub fn new(embedder: Arc<dyn Embedder>, tokenizer: Arc<dyn TokenCounter>) -> Self {
        Self {
            embedder,
            tokenizer,
        }
    }

    /// Use one value for both capabilities.
    pub fn from_shared<M>(model: Arc<M>) -> Self
    where
        M: Embedder + TokenCounter + 'static,
    {
        Self {
            embedder: model.clone(),
            tokenizer: model,
        }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}

/// Resolves an optional model identifier to a loaded model.
///
/// `None` selects the configured default.
pub trait ModelProvider: Send + Sync {
    fn resolve(&self, model: Option<&str>) -> Result<SentenceModel, EmbeddingError>;
}
