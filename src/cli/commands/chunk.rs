//! Chunk command - run the pipeline on a local file.

use anyhow::Context;
use std::path::PathBuf;

use crate::chunking::{
    ChunkingConfig, ChunkingResult, ContextWindow, SemanticChunker, validate_budget,
};
use crate::config::Settings;
use crate::decode::decode_text;
use crate::semantic::ModelProvider;

/// Arguments for the chunk command.
pub struct ChunkArgs {
    pub file: PathBuf,
    pub max_tokens: i64,
    pub model: Option<String>,
    pub percentile: Option<i64>,
    pub min_chunk_fraction: Option<f32>,
    pub context: Option<ContextWindow>,
    pub output: Option<PathBuf>,
    pub compact: bool,
}

impl ChunkArgs {
    /// Settings overlaid with command line overrides.
    fn chunking_config(&self, settings: &Settings) -> anyhow::Result<ChunkingConfig> {
        let mut config = settings.chunking.clone().with_percentile(self.percentile)?;
        if let Some(fraction) = self.min_chunk_fraction {
            config.min_chunk_fraction = Some(fraction);
        }
        if let Some(context) = self.context {
            config.context_window = context;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Chunk the file named in `args`.
///
/// Inputs are validated before any model is loaded.
pub fn execute(
    args: &ChunkArgs,
    settings: &Settings,
    provider: &dyn ModelProvider,
) -> anyhow::Result<ChunkingResult> {
    validate_budget(args.max_tokens)?;
    let config = args.chunking_config(settings)?;

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let decoded = decode_text(&bytes)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;
    tracing::debug!(
        target: "cli",
        "decoded {} as {}",
        args.file.display(),
        decoded.encoding.name()
    );

    let model = provider.resolve(args.model.as_deref())?;
    let result = SemanticChunker::new(model, config).chunk(&decoded.text, args.max_tokens)?;
    Ok(result)
}

/// Run the chunk command and print or write the JSON result.
pub fn run(
    args: ChunkArgs,
    settings: &Settings,
    provider: &dyn ModelProvider,
) -> anyhow::Result<()> {
    let result = execute(&args, settings, provider)?;

    for warning in &result.warnings {
        eprintln!("Warning: {warning}");
    }

    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(
                target: "cli",
                "wrote {} chunks to {}",
                result.metadata.n_chunks,
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
