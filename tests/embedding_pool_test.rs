//! End-to-end runs against a real fastembed model.

use semchunk::chunking::{ChunkingConfig, SemanticChunker};
use semchunk::config::EmbeddingConfig;
use semchunk::semantic::{DEFAULT_MODEL, ModelProvider, ModelRegistry};

fn registry() -> ModelRegistry {
    ModelRegistry::new(EmbeddingConfig {
        pool_size: 2,
        batch_size: 4,
        ..Default::default()
    })
}

#[test]
#[ignore = "Downloads 86MB model - run with --ignored"]
fn test_real_model_splits_topics() {
    let registry = registry();
    let model = registry.resolve(None).unwrap();
    assert_eq!(model.model_name(), DEFAULT_MODEL);

    let document = "The cat curled up on the sofa. My dog loves chasing the cat around the garden. \
        Kittens and puppies need a lot of sleep. Our pets are fed twice a day. \
        The central bank raised interest rates again. Bond yields climbed after the announcement. \
        Investors sold technology shares. The stock index closed lower for the week.";

    let chunker = SemanticChunker::new(
        model,
        ChunkingConfig::default().with_percentile(Some(80)).unwrap(),
    );
    let result = chunker.chunk(document, 512).unwrap();

    assert!(result.chunks.len() >= 2);
    assert!(result.chunks[0].text.starts_with("The cat"));
    assert!(!result.has_oversized());
}

#[test]
#[ignore = "Downloads 86MB model - run with --ignored"]
fn test_token_counts_use_model_vocabulary() {
    let registry = registry();
    let model = registry.resolve(Some("sentence-transformers/all-MiniLM-L6-v2")).unwrap();
    let chunker = SemanticChunker::new(model, ChunkingConfig::default());

    let long_sentence = format!("{}.", "tokenization ".repeat(600).trim_end());
    let result = chunker.chunk(&long_sentence, 100).unwrap();

    assert_eq!(result.chunks.len(), 1);
    assert!(result.chunks[0].token_count > 512, "counts must not be truncated");
    assert!(result.has_oversized());
    assert_eq!(registry.loaded_models(), vec![DEFAULT_MODEL.to_string()]);
}
