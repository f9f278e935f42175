//! End-to-end chunking run.
//!
//! Stages run strictly in order:
//! 1. Validate the budget and configuration
//! 2. Split the document into sentences
//! 3. Count tokens per sentence
//! 4. Embed every sentence under one context window policy
//! 5. Detect semantic boundaries
//! 6. Pack sentences into chunks
//! 7. Aggregate run metadata

use std::time::Instant;

use super::boundary::BoundarySignal;
use super::config::ChunkingConfig;
use super::error::ChunkingError;
use super::packer::{PackingPolicy, pack_chunks};
use super::splitter::split_sentences;
use super::types::{ChunkingResult, OversizedSentence, RunMetadata, Sentence};
use crate::semantic::{EmbeddingError, SentenceModel};

/// Check a caller-supplied token budget.
pub fn validate_budget(max_tokens: i64) -> Result<usize, ChunkingError> {
    usize::try_from(max_tokens)
        .ok()
        .filter(|n| *n > 0)
        .ok_or(ChunkingError::InvalidBudget { max_tokens })
}

/// Splits documents into token-bounded, topic-aligned chunks.
///
/// Holds no per-run state; one instance can serve any number of runs, including
/// concurrent ones.
#[derive(Clone)]
pub struct SemanticChunker {
    model: SentenceModel,
    config: ChunkingConfig,
}

impl SemanticChunker {
    pub fn new(model: SentenceModel, config: ChunkingConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Chunk `document` so that no chunk exceeds `max_tokens`, except single
    /// sentences that are larger on their own.
    pub fn chunk(&self, document: &str, max_tokens: i64) -> Result<ChunkingResult, ChunkingError> {
        let max_tokens = validate_budget(max_tokens)?;
        self.config.validate()?;

        let started = Instant::now();

        let spans = split_sentences(document)?;

        let token_counts = spans
            .iter()
            .map(|span| {
                self.model
                    .tokenizer
                    .count_tokens(&span.text)
                    .map(|count| count.max(1))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let inputs = self.config.context_window.embedding_inputs(&spans);
        let embeddings = self.model.embedder.embed(&inputs)?;
        check_embeddings(&embeddings, spans.len())?;

        let signal = {
            let refs: Vec<&[f32]> = embeddings.iter().map(Vec::as_slice).collect();
            BoundarySignal::detect(&refs, self.config.percentile)
        };

        let sentences: Vec<Sentence> = spans
            .into_iter()
            .zip(token_counts)
            .zip(embeddings)
            .map(|((span, count), embedding)| Sentence::from_span(span, count, embedding))
            .collect();

        let policy =
            PackingPolicy::new(max_tokens).with_min_chunk_fraction(self.config.min_chunk_fraction);
        let chunks = pack_chunks(document, &sentences, &signal, &policy);

        let warnings: Vec<OversizedSentence> = chunks
            .iter()
            .filter(|chunk| chunk.oversized)
            .map(|chunk| OversizedSentence {
                chunk_id: chunk.id,
                sentence_index: chunk.sentences.lo,
                token_count: chunk.token_count,
                max_tokens,
            })
            .collect();
        for warning in &warnings {
            tracing::warn!(target: "pipeline", "oversized sentence: {warning}");
        }

        let metadata = RunMetadata::aggregate(
            &chunks,
            self.config.percentile,
            self.model.model_name(),
            started.elapsed(),
        );

        tracing::debug!(
            target: "pipeline",
            "chunked {} sentences into {} chunks ({} cuts, threshold {:.4}) in {:.3}s",
            sentences.len(),
            metadata.n_chunks,
            signal.cuts.len(),
            signal.threshold,
            metadata.processing_time
        );

        Ok(ChunkingResult {
            chunks,
            metadata,
            warnings,
            cut_points: signal.cuts,
        })
    }
}

/// One vector per sentence, all of the same dimension.
fn check_embeddings(embeddings: &[Vec<f32>], expected: usize) -> Result<(), EmbeddingError> {
    if embeddings.len() != expected {
        return Err(EmbeddingError::LengthMismatch {
            expected,
            actual: embeddings.len(),
        });
    }

    if let Some(first) = embeddings.first() {
        let dimensions = first.len();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimensions,
                actual: bad.len(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{Embedder, TokenCounter};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Every sentence gets the same vector; counts whitespace-separated words.
    #[derive(Default)]
    struct FlatModel {
        embed_calls: AtomicUsize,
        drop_last: bool,
        ragged: bool,
    }

    impl Embedder for FlatModel {
        fn model_name(&self) -> &str {
            "flat"
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            let mut vectors: Vec<Vec<f32>> = texts.iter().map(|_| vec![1.0, 1.0]).collect();
            if self.drop_last {
                vectors.pop();
            }
            if self.ragged {
                if let Some(last) = vectors.last_mut() {
                    last.push(0.0);
                }
            }
            Ok(vectors)
        }
    }

    impl TokenCounter for FlatModel {
        fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
            Ok(text.split_whitespace().count())
        }
    }

    fn chunker(model: FlatModel) -> (SemanticChunker, Arc<FlatModel>) {
        let model = Arc::new(model);
        let chunker = SemanticChunker::new(
            SentenceModel::from_shared(model.clone()),
            ChunkingConfig::default(),
        );
        (chunker, model)
    }

    #[test]
    fn test_validate_budget() {
        assert_eq!(validate_budget(1).unwrap(), 1);
        assert!(matches!(
            validate_budget(0),
            Err(ChunkingError::InvalidBudget { max_tokens: 0 })
        ));
        assert!(validate_budget(-5).is_err());
    }

    #[test]
    fn test_invalid_budget_rejected_before_embedding() {
        let (chunker, model) = chunker(FlatModel::default());
        let err = chunker.chunk("Some text here.", 0).unwrap_err();

        assert_eq!(err.to_string(), "max_tokens must be positive, got 0");
        assert_eq!(model.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_document() {
        let (chunker, _) = chunker(FlatModel::default());
        assert!(matches!(
            chunker.chunk("   \n\n ", 100),
            Err(ChunkingError::EmptyDocument)
        ));
    }

    #[test]
    fn test_single_sentence() {
        let (chunker, model) = chunker(FlatModel::default());
        let result = chunker.chunk("The cat sat on the mat.", 100).unwrap();

        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].id.value(), 1);
        assert_eq!(result.chunks[0].text, "The cat sat on the mat.");
        assert_eq!(result.chunks[0].token_count, 6);
        assert_eq!(result.metadata.n_chunks, 1);
        assert_eq!(result.metadata.embedder_model, "flat");
        assert_eq!(result.metadata.percentile, 95);
        assert!(!result.has_oversized());
        assert_eq!(model.embed_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_oversized_sentence_reported() {
        let (chunker, _) = chunker(FlatModel::default());
        let result = chunker.chunk("One two three four five six.", 3).unwrap();

        assert_eq!(result.chunks.len(), 1);
        assert!(result.chunks[0].oversized);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].token_count, 6);
        assert_eq!(result.warnings[0].max_tokens, 3);
    }

    #[test]
    fn test_embedding_length_mismatch() {
        let (chunker, _) = chunker(FlatModel {
            drop_last: true,
            ..Default::default()
        });
        let err = chunker.chunk("First one. Second one.", 100).unwrap_err();
        assert!(matches!(
            err,
            ChunkingError::Embedding(EmbeddingError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_embedding_dimension_mismatch() {
        let (chunker, _) = chunker(FlatModel {
            ragged: true,
            ..Default::default()
        });
        let err = chunker.chunk("First one. Second one.", 100).unwrap_err();
        assert!(matches!(
            err,
            ChunkingError::Embedding(EmbeddingError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_merge_fraction_rejected() {
        let model = Arc::new(FlatModel::default());
        let chunker = SemanticChunker::new(
            SentenceModel::from_shared(model),
            ChunkingConfig {
                min_chunk_fraction: Some(2.0),
                ..Default::default()
            },
        );
        assert!(matches!(
            chunker.chunk("Text.", 10),
            Err(ChunkingError::InvalidMergeFraction { .. })
        ));
    }
}
