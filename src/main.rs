use clap::Parser;
use std::path::Path;

use semchunk::cli::commands::{chunk, init, serve};
use semchunk::cli::{Cli, Commands};
use semchunk::{ModelRegistry, Settings, logging};

/// Load settings from `--config` or the workspace, then set up logging.
fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    logging::init_with_config(&settings.logging);
    tracing::debug!(target: "cli", "settings loaded");
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        // Init does not read settings, so it also repairs a broken file
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&load_settings(config)?),
        Commands::Serve { bind } => serve::run(bind, load_settings(config)?).await,
        Commands::Chunk {
            file,
            max_tokens,
            model,
            percentile,
            min_chunk_fraction,
            context,
            output,
            compact,
        } => {
            let settings = load_settings(config)?;
            let registry = ModelRegistry::new(settings.embedding.clone());
            let args = chunk::ChunkArgs {
                file,
                max_tokens,
                model,
                percentile,
                min_chunk_fraction,
                context,
                output,
                compact,
            };
            tokio::task::block_in_place(|| chunk::run(args, &settings, &registry))
        }
    }
}
