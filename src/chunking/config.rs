//! Configuration types for semantic chunking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ChunkingError;
use super::types::SentenceSpan;

/// Boundary sensitivity used when nothing else is configured.
pub const DEFAULT_PERCENTILE: u8 = 95;

/// Configuration for a chunking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Percentile of inter-sentence distances used as the cut threshold.
    #[serde(default = "default_percentile")]
    pub percentile: u8,

    /// Chunks smaller than this fraction of the budget absorb their successor.
    /// Unset disables the merge pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_chunk_fraction: Option<f32>,

    /// Text handed to the embedder for each sentence.
    #[serde(default)]
    pub context_window: ContextWindow,
}

fn default_percentile() -> u8 {
    DEFAULT_PERCENTILE
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            percentile: default_percentile(),
            min_chunk_fraction: None,
            context_window: ContextWindow::default(),
        }
    }
}

impl ChunkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.percentile > 100 {
            return Err(ChunkingError::InvalidPercentile {
                percentile: i64::from(self.percentile),
            });
        }

        if let Some(fraction) = self.min_chunk_fraction {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ChunkingError::InvalidMergeFraction { fraction });
            }
        }

        Ok(())
    }

    /// Copy of this config with a caller-supplied percentile, if any.
    pub fn with_percentile(mut self, percentile: Option<i64>) -> Result<Self, ChunkingError> {
        if let Some(p) = percentile {
            self.percentile = u8::try_from(p)
                .ok()
                .filter(|p| *p <= 100)
                .ok_or(ChunkingError::InvalidPercentile { percentile: p })?;
        }
        Ok(self)
    }
}

/// How much surrounding text each sentence is embedded with.
///
/// One policy applies to a whole run; distances are only comparable when every
/// sentence was embedded the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextWindow {
    /// Each sentence alone.
    #[default]
    Sentence,
    /// Each sentence followed by the next one. The last sentence is embedded alone.
    WithNext,
}

impl ContextWindow {
    /// Build the embedder inputs for a run, one per sentence, in order.
    pub fn embedding_inputs(&self, spans: &[SentenceSpan]) -> Vec<String> {
        match self {
            Self::Sentence => spans.iter().map(|s| s.text.clone()).collect(),
            Self::WithNext => spans
                .iter()
                .enumerate()
                .map(|(i, span)| match spans.get(i + 1) {
                    Some(next) => format!("{} {}", span.text, next.text),
                    None => span.text.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentence => f.write_str("sentence"),
            Self::WithNext => f.write_str("with_next"),
        }
    }
}

impl FromStr for ContextWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "sentence" => Ok(Self::Sentence),
            "with_next" => Ok(Self::WithNext),
            other => Err(format!(
                "unknown context window '{other}' (expected 'sentence' or 'with_next')"
            )),
        }
    }
}
