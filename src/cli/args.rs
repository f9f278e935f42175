//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::chunking::ContextWindow;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "Quick Start:
  $ semchunk init                                 # Write .semchunk/settings.toml
  $ semchunk chunk notes.txt --max-tokens 256     # Print chunks as JSON
  $ semchunk serve --bind 0.0.0.0:8000            # Start the HTTP endpoint";

/// Semantic document chunker
#[derive(Parser)]
#[command(
    name = "semchunk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Split documents into token-bounded chunks at topic boundaries",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chunk a text file and print the result as JSON
    Chunk {
        /// File to chunk
        file: PathBuf,

        /// Token budget per chunk
        #[arg(short, long, allow_negative_numbers = true)]
        max_tokens: i64,

        /// Embedding model (defaults to embedding.model from settings)
        #[arg(long)]
        model: Option<String>,

        /// Boundary percentile, 0 to 100 (defaults to chunking.percentile)
        #[arg(short, long, allow_negative_numbers = true)]
        percentile: Option<i64>,

        /// Merge chunks smaller than this fraction of the budget into their successor
        #[arg(long)]
        min_chunk_fraction: Option<f32>,

        /// Text embedded per sentence: `sentence` or `with-next`
        #[arg(long)]
        context: Option<ContextWindow>,

        /// Write JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Bind address (defaults to server.bind from settings)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Set up .semchunk directory with default settings
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chunk_command() {
        let cli = Cli::parse_from([
            "semchunk",
            "chunk",
            "doc.txt",
            "--max-tokens",
            "128",
            "--context",
            "with-next",
            "--compact",
        ]);

        match cli.command {
            Commands::Chunk {
                file,
                max_tokens,
                context,
                compact,
                percentile,
                ..
            } => {
                assert_eq!(file, PathBuf::from("doc.txt"));
                assert_eq!(max_tokens, 128);
                assert_eq!(context, Some(ContextWindow::WithNext));
                assert!(compact);
                assert_eq!(percentile, None);
            }
            _ => panic!("expected chunk command"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["semchunk", "config", "--config", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_negative_budget_parses() {
        let cli = Cli::parse_from(["semchunk", "chunk", "doc.txt", "--max-tokens", "-5"]);
        assert!(matches!(cli.command, Commands::Chunk { max_tokens: -5, .. }));
    }
}
