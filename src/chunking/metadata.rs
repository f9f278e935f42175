//! Summary statistics over a finished chunk list.

use std::time::Duration;

use super::types::{Chunk, RunMetadata};

impl RunMetadata {
    /// Aggregate statistics for `chunks`.
    ///
    /// `max_tokens` and `min_tokens` are the extremes actually produced, not the
    /// requested budget. An empty list yields zeros.
    pub fn aggregate(
        chunks: &[Chunk],
        percentile: u8,
        embedder_model: &str,
        elapsed: Duration,
    ) -> Self {
        let counts = chunks.iter().map(|c| c.token_count);
        let total: usize = counts.clone().sum();

        let avg_tokens = if chunks.is_empty() {
            0
        } else {
            (total as f64 / chunks.len() as f64).round() as usize
        };

        Self {
            n_chunks: chunks.len(),
            avg_tokens,
            max_tokens: counts.clone().max().unwrap_or(0),
            min_tokens: counts.min().unwrap_or(0),
            percentile,
            embedder_model: embedder_model.to_string(),
            processing_time: elapsed.as_secs_f64(),
        }
    }
}
