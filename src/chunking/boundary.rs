//! Semantic boundary detection.
//!
//! Adjacent sentences are compared by cosine distance. The `p`-th percentile of
//! those distances over the whole document is the cut threshold, and a cut is
//! placed after every sentence whose distance to the next one is strictly above
//! it. Percentiles use linear interpolation between order statistics (the same
//! rule as numpy's default), so the result is reproducible across runs.

use crate::semantic::cosine_distance;

use super::types::Segment;

/// Distance signal and cut points for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySignal {
    /// `distances[i]` is the distance between sentence `i` and `i + 1`.
    pub distances: Vec<f64>,
    /// Percentile threshold. Zero when there are no distances.
    pub threshold: f64,
    /// Sentence indices followed by a cut, ascending.
    pub cuts: Vec<usize>,
}

impl BoundarySignal {
    /// Compute the signal for ordered sentence embeddings.
    pub fn detect(embeddings: &[&[f32]], percentile: u8) -> Self {
        let distances: Vec<f64> = embeddings
            .windows(2)
            .map(|pair| f64::from(cosine_distance(pair[0], pair[1])).max(0.0))
            .collect();

        let Some(threshold) = percentile_linear(&distances, f64::from(percentile)) else {
            return Self {
                distances,
                threshold: 0.0,
                cuts: Vec::new(),
            };
        };

        let cuts = distances
            .iter()
            .enumerate()
            .filter(|&(_, d)| *d > threshold)
            .map(|(i, _)| i)
            .collect();

        Self {
            distances,
            threshold,
            cuts,
        }
    }

    /// Whether a cut follows sentence `index`.
    pub fn is_cut_after(&self, index: usize) -> bool {
        self.cuts.binary_search(&index).is_ok()
    }

    /// Candidate segments for `sentence_count` sentences: maximal runs between cuts.
    pub fn segments(&self, sentence_count: usize) -> Vec<Segment> {
        if sentence_count == 0 {
            return Vec::new();
        }

        let mut segments = Vec::with_capacity(self.cuts.len() + 1);
        let mut lo = 0;
        for &cut in &self.cuts {
            segments.push(Segment::new(lo, cut));
            lo = cut + 1;
        }
        segments.push(Segment::new(lo, sentence_count - 1));
        segments
    }
}

/// `p`-th percentile (0..=100) with linear interpolation between order statistics.
///
/// Returns None for an empty sample.
pub fn percentile_linear(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
