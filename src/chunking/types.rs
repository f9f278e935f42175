//! Core types for semantic chunking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Identifier of a chunk in the final output.
///
/// Ids are 1-based and gapless. Serializes as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(NonZeroU32);

impl ChunkId {
    /// Id for the chunk at a 0-based position in the output.
    pub fn from_position(position: usize) -> Self {
        let value = u32::try_from(position)
            .ok()
            .and_then(|p| p.checked_add(1))
            .and_then(NonZeroU32::new)
            .unwrap_or(NonZeroU32::MAX);
        Self(value)
    }

    /// Get the inner value as u32.
    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sentence as produced by the splitter, before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    /// Sentence text without surrounding whitespace.
    pub text: String,
    /// Byte offset of the first character in the document.
    pub start_offset: usize,
    /// Byte offset one past the last character in the document.
    pub end_offset: usize,
}

/// A fully scored sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub token_count: usize,
    pub embedding: Vec<f32>,
}

impl Sentence {
    /// Attach a token count and an embedding to a span.
    pub fn from_span(span: SentenceSpan, token_count: usize, embedding: Vec<f32>) -> Self {
        Self {
            text: span.text,
            start_offset: span.start_offset,
            end_offset: span.end_offset,
            token_count,
            embedding,
        }
    }
}

/// Inclusive run of sentence indices `[lo, hi]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Segment {
    pub lo: usize,
    pub hi: usize,
}

impl Segment {
    pub fn new(lo: usize, hi: usize) -> Self {
        debug_assert!(lo <= hi, "segment bounds out of order: {lo} > {hi}");
        Self { lo, hi }
    }

    pub fn single(index: usize) -> Self {
        Self { lo: index, hi: index }
    }
}

/// Final output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub token_count: usize,

    /// Sentences that make up this chunk.
    #[serde(skip)]
    pub sentences: Segment,

    /// Single sentence larger than the requested budget.
    #[serde(skip)]
    pub oversized: bool,
}

/// Summary statistics over a finished chunk list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub n_chunks: usize,
    pub avg_tokens: usize,
    /// Largest chunk actually produced (not the requested budget).
    pub max_tokens: usize,
    /// Smallest chunk actually produced.
    pub min_tokens: usize,
    pub percentile: u8,
    pub embedder_model: String,
    /// Wall-clock seconds spent in the pipeline.
    pub processing_time: f64,
}

/// A sentence that could not fit the token budget on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedSentence {
    pub chunk_id: ChunkId,
    pub sentence_index: usize,
    pub token_count: usize,
    pub max_tokens: usize,
}

impl fmt::Display for OversizedSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk {} holds sentence {} with {} tokens, over the {} token budget",
            self.chunk_id, self.sentence_index, self.token_count, self.max_tokens
        )
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub chunks: Vec<Chunk>,
    pub metadata: RunMetadata,

    /// Oversized sentences, reported outside the JSON contract.
    #[serde(skip)]
    pub warnings: Vec<OversizedSentence>,

    /// Sentence indices after which a semantic cut was detected.
    #[serde(skip)]
    pub cut_points: Vec<usize>,
}

impl ChunkingResult {
    pub fn has_oversized(&self) -> bool {
        !self.warnings.is_empty()
    }
}
