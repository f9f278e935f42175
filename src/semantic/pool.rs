//! Embedding model pool for parallel embedding generation
//!
//! Provides multiple TextEmbedding instances that can be used concurrently
//! by different threads. A pool is loaded once per model and shared read-only
//! by every chunking run that asks for that model.

use crossbeam_channel::{Receiver, Sender, bounded};
use fastembed::{InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::models::ResolvedModelName;
use super::{Embedder, EmbeddingError, TokenCounter};

/// Model instance with an ID for tracking
struct ModelInstance {
    model: TextEmbedding,
    id: usize,
}

type CountFn = Box<dyn Fn(&str) -> Result<usize, String> + Send + Sync>;

/// Pool of TextEmbedding models for parallel embedding generation.
///
/// Each model instance is expensive (~86MB for MiniLM), but having multiple allows
/// sub-batches of one document, and concurrent requests, to embed in parallel.
pub struct EmbeddingPool {
    /// Channel to acquire models from the pool
    model_sender: Sender<ModelInstance>,
    model_receiver: Receiver<ModelInstance>,
    /// Number of models in the pool
    pool_size: usize,
    /// Texts per model call
    batch_size: usize,
    /// Model dimensions (all models have same dimensions)
    dimensions: usize,
    /// Model name for metadata
    model_name: String,
    /// Untruncated tokenizer of the same model
    count_tokens: CountFn,
    /// Usage counters per model instance (for tracing)
    usage_counters: Vec<AtomicUsize>,
}

impl EmbeddingPool {
    /// Create a new embedding pool with the specified number of model instances.
    ///
    /// # Arguments
    /// * `model` - The resolved model to load
    /// * `pool_size` - Number of TextEmbedding instances to create
    /// * `batch_size` - Texts sent to a model instance per call
    /// * `cache_dir` - Where fastembed stores downloaded weights
    pub fn new(
        model: &ResolvedModelName,
        pool_size: usize,
        batch_size: usize,
        cache_dir: PathBuf,
        show_download_progress: bool,
    ) -> Result<Self, EmbeddingError> {
        let pool_size = pool_size.max(1);
        let (sender, receiver) = bounded(pool_size);
        let model_name = model.name.clone();

        tracing::info!(
            target: "semantic",
            "Initializing embedding pool: {pool_size} instances ({model_name})"
        );

        let mut dimensions = 0;
        let mut count_tokens: Option<CountFn> = None;

        // Create usage counters for each model
        let usage_counters: Vec<AtomicUsize> =
            (0..pool_size).map(|_| AtomicUsize::new(0)).collect();

        for i in 0..pool_size {
            let mut text_model = TextEmbedding::try_new(
                InitOptions::new(model.model.clone())
                    .with_cache_dir(cache_dir.clone())
                    // Only show progress for first model
                    .with_show_download_progress(show_download_progress && i == 0),
            )
            .map_err(|e| {
                EmbeddingError::ModelInitError(format!(
                    "Failed to initialize model instance {}: {}",
                    i + 1,
                    e
                ))
            })?;

            // Get dimensions and the tokenizer from the first model
            if i == 0 {
                let test_embedding = text_model
                    .embed(vec!["test"], None)
                    .map_err(|e| EmbeddingError::EmbeddingError(e.to_string()))?;
                dimensions = test_embedding
                    .into_iter()
                    .next()
                    .map(|v| v.len())
                    .ok_or_else(|| {
                        EmbeddingError::ModelInitError("model returned no probe vector".into())
                    })?;

                // fastembed truncates to the model's input length; counts must not be capped.
                let mut tokenizer = text_model.tokenizer.clone();
                tokenizer.with_padding(None);
                tokenizer.with_truncation(None).map_err(|e| {
                    EmbeddingError::ModelInitError(format!("Failed to configure tokenizer: {e}"))
                })?;
                count_tokens = Some(Box::new(move |text: &str| {
                    tokenizer
                        .encode(text, false)
                        .map(|encoding| encoding.len())
                        .map_err(|e| e.to_string())
                }));
            }

            let instance = ModelInstance {
                model: text_model,
                id: i,
            };
            sender.send(instance).map_err(|_| {
                EmbeddingError::ModelInitError("Pool channel closed during startup".into())
            })?;
        }

        let count_tokens = count_tokens
            .ok_or_else(|| EmbeddingError::ModelInitError("Pool has no model instances".into()))?;

        tracing::info!(
            target: "semantic",
            "Embedding pool ready: {pool_size} instances, {dimensions} dimensions"
        );

        Ok(Self {
            model_sender: sender,
            model_receiver: receiver,
            pool_size,
            batch_size: batch_size.max(1),
            dimensions,
            model_name,
            count_tokens,
            usage_counters,
        })
    }

    /// Acquire a model from the pool (blocks if none available)
    fn acquire(&self) -> Result<ModelInstance, EmbeddingError> {
        let instance = self
            .model_receiver
            .recv()
            .map_err(|_| EmbeddingError::EmbeddingError("Embedding pool is closed".into()))?;

        // Increment usage counter for this model
        self.usage_counters[instance.id].fetch_add(1, Ordering::Relaxed);

        Ok(instance)
    }

    /// Return a model to the pool
    fn release(&self, instance: ModelInstance) {
        let _ = self.model_sender.send(instance);
    }

    /// Get the embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get the pool size
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Log usage statistics for all model instances.
    pub fn log_usage_stats(&self) {
        let counts: Vec<usize> = self
            .usage_counters
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect();
        let total: usize = counts.iter().sum();

        if total > 0 {
            let usage_str: Vec<String> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| format!("model[{i}]={c}"))
                .collect();

            tracing::debug!(
                target: "semantic",
                "Embedding pool usage: {} (total: {total})",
                usage_str.join(", ")
            );
        }
    }

    /// Embed all texts, splitting them into batches spread over the pool with rayon.
    ///
    /// Output order matches input order regardless of scheduling. Any failed batch
    /// fails the whole call.
    pub fn embed_ordered(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        use rayon::prelude::*;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<Vec<Vec<f32>>> = texts
            .par_chunks(self.batch_size)
            .map(|batch| {
                let inputs: Vec<&str> = batch.iter().map(String::as_str).collect();

                // Acquire model, embed entire batch, release model
                let mut instance = self.acquire()?;
                let result = instance.model.embed(inputs, None);
                self.release(instance);

                let embeddings =
                    result.map_err(|e| EmbeddingError::EmbeddingError(e.to_string()))?;
                if embeddings.len() != batch.len() {
                    return Err(EmbeddingError::LengthMismatch {
                        expected: batch.len(),
                        actual: embeddings.len(),
                    });
                }
                if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: bad.len(),
                    });
                }
                Ok(embeddings)
            })
            .collect::<Result<_, _>>()?;

        self.log_usage_stats();

        Ok(batches.into_iter().flatten().collect())
    }
}

impl Embedder for EmbeddingPool {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_ordered(texts)
    }
}

impl TokenCounter for EmbeddingPool {
    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        (self.count_tokens)(text).map_err(EmbeddingError::TokenizationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{DEFAULT_MODEL, resolve_model};

    fn test_pool(pool_size: usize, batch_size: usize) -> EmbeddingPool {
        let model = resolve_model(DEFAULT_MODEL).unwrap();
        let cache = std::env::temp_dir().join("semchunk-test-models");
        EmbeddingPool::new(&model, pool_size, batch_size, cache, false).unwrap()
    }

    #[test]
    #[ignore = "Downloads 86MB model - run with --ignored"]
    fn test_pool_creation() {
        let pool = test_pool(2, 64);
        assert_eq!(pool.pool_size(), 2);
        assert_eq!(pool.dimensions(), 384); // AllMiniLML6V2
        assert_eq!(pool.model_name(), DEFAULT_MODEL);
    }

    #[test]
    #[ignore = "Downloads 86MB model - run with --ignored"]
    fn test_parallel_embedding_preserves_order() {
        let pool = test_pool(2, 2);

        let texts: Vec<String> = [
            "Parse JSON data",
            "Connect to database",
            "Calculate hash",
            "The rabbit ran down the hole",
            "Parse JSON data",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let embeddings = pool.embed(&texts).unwrap();
        assert_eq!(embeddings.len(), 5);
        // Same text in different batches yields the same vector
        let d = crate::semantic::cosine_distance(&embeddings[0], &embeddings[4]);
        assert!(d.abs() < 1e-4);
    }

    #[test]
    #[ignore = "Downloads 86MB model - run with --ignored"]
    fn test_token_count_is_not_truncated() {
        let pool = test_pool(1, 64);
        let long_text = "word ".repeat(2000);
        let count = pool.count_tokens(&long_text).unwrap();
        assert!(count >= 2000, "expected untruncated count, got {count}");
    }
}
