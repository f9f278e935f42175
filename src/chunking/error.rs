//! Errors raised by a chunking run.

use crate::semantic::EmbeddingError;

/// Hard failures of a pipeline run. Any of these aborts the run with no partial result.
#[derive(Debug, thiserror::Error)]
pub enum ChunkingError {
    #[error("document contains no extractable sentences")]
    EmptyDocument,

    #[error("max_tokens must be positive, got {max_tokens}")]
    InvalidBudget { max_tokens: i64 },

    #[error("percentile must be between 0 and 100, got {percentile}")]
    InvalidPercentile { percentile: i64 },

    #[error("min_chunk_fraction must be in (0, 1], got {fraction}")]
    InvalidMergeFraction { fraction: f32 },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

impl ChunkingError {
    /// True when the caller supplied bad input, as opposed to a model failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::EmptyDocument
            | Self::InvalidBudget { .. }
            | Self::InvalidPercentile { .. }
            | Self::InvalidMergeFraction { .. } => true,
            Self::Embedding(e) => matches!(e, EmbeddingError::UnknownModel(_)),
        }
    }
}
