//! Semantic segmentation and packing.
//!
//! A document is split into sentences, every sentence is embedded, cuts are
//! placed where the distance between neighbours is unusually large, and the
//! sentences are then packed greedily into chunks under a token budget.

pub mod boundary;
pub mod config;
pub mod error;
pub mod metadata;
pub mod packer;
pub mod pipeline;
pub mod splitter;
pub mod types;

pub use boundary::{BoundarySignal, percentile_linear};
pub use config::{ChunkingConfig, ContextWindow, DEFAULT_PERCENTILE};
pub use error::ChunkingError;
pub use packer::{PackingPolicy, PlannedChunk, pack_chunks, plan_chunks};
pub use pipeline::{SemanticChunker, validate_budget};
pub use splitter::split_sentences;
pub use types::{
    Chunk, ChunkId, ChunkingResult, OversizedSentence, RunMetadata, Segment, Sentence,
    SentenceSpan,
};
