pub mod chunking;
pub mod cli;
pub mod config;
pub mod decode;
pub mod logging;
pub mod semantic;
#[cfg(feature = "http-server")]
pub mod server;

pub use chunking::{
    Chunk, ChunkId, ChunkingConfig, ChunkingError, ChunkingResult, ContextWindow, RunMetadata,
    SemanticChunker,
};
pub use config::Settings;
pub use decode::{DecodeError, decode_text};
pub use semantic::{
    Embedder, EmbeddingError, ModelProvider, ModelRegistry, SentenceModel, TokenCounter,
};
