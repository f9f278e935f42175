//! Greedy chunk packing under a token budget.
//!
//! Algorithm:
//! 1. Walk sentences left to right, accumulating a buffer
//! 2. Close the buffer at a semantic cut, or when the next sentence would push it past the budget
//! 3. Emit any sentence larger than the budget on its own, flagged as oversized
//! 4. Optionally sweep once more, letting undersized chunks absorb their successor
//! 5. Number chunks from 1 in output order

use super::boundary::BoundarySignal;
use super::types::{Chunk, ChunkId, Segment, Sentence};

/// Budget and cleanup policy for the packer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackingPolicy {
    /// Requested token budget per chunk.
    pub max_tokens: usize,
    /// Merge threshold as a fraction of `max_tokens`. None disables merging.
    pub min_chunk_fraction: Option<f32>,
}

impl PackingPolicy {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            min_chunk_fraction: None,
        }
    }

    pub fn with_min_chunk_fraction(mut self, fraction: Option<f32>) -> Self {
        self.min_chunk_fraction = fraction;
        self
    }
}

/// A packed run of sentences, before text is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedChunk {
    pub segment: Segment,
    pub token_count: usize,
    pub oversized: bool,
}

impl PlannedChunk {
    fn packed(lo: usize, hi: usize, token_count: usize) -> Self {
        Self {
            segment: Segment::new(lo, hi),
            token_count,
            oversized: false,
        }
    }
}

/// Plan chunk boundaries from token counts and candidate segments.
///
/// `segments` are the maximal runs between semantic cuts, in order, covering
/// every sentence exactly once.
pub fn plan_chunks(
    token_counts: &[usize],
    segments: &[Segment],
    policy: &PackingPolicy,
) -> Vec<PlannedChunk> {
    let planned = greedy_pass(token_counts, segments, policy.max_tokens);

    match policy.min_chunk_fraction {
        Some(fraction) => forward_merge(planned, policy.max_tokens, fraction),
        None => planned,
    }
}

/// Pack scored sentences into final chunks.
///
/// Chunk text is the document slice from the first sentence's start to the last
/// sentence's end, so whitespace between sentences is the original.
pub fn pack_chunks(
    document: &str,
    sentences: &[Sentence],
    signal: &BoundarySignal,
    policy: &PackingPolicy,
) -> Vec<Chunk> {
    let token_counts: Vec<usize> = sentences.iter().map(|s| s.token_count).collect();
    let segments = signal.segments(sentences.len());

    plan_chunks(&token_counts, &segments, policy)
        .into_iter()
        .enumerate()
        .map(|(position, planned)| {
            let start = sentences[planned.segment.lo].start_offset;
            let end = sentences[planned.segment.hi].end_offset;
            Chunk {
                id: ChunkId::from_position(position),
                text: document[start..end].to_string(),
                token_count: planned.token_count,
                sentences: planned.segment,
                oversized: planned.oversized,
            }
        })
        .collect()
}

fn greedy_pass(
    token_counts: &[usize],
    segments: &[Segment],
    max_tokens: usize,
) -> Vec<PlannedChunk> {
    let mut planned = Vec::new();

    for segment in segments {
        // (first sentence, tokens so far) of the open buffer
        let mut buffer: Option<(usize, usize)> = None;

        for (i, &count) in token_counts
            .iter()
            .enumerate()
            .take(segment.hi + 1)
            .skip(segment.lo)
        {
            if count > max_tokens {
                if let Some((lo, tokens)) = buffer.take() {
                    planned.push(PlannedChunk::packed(lo, i - 1, tokens));
                }
                planned.push(PlannedChunk {
                    segment: Segment::single(i),
                    token_count: count,
                    oversized: true,
                });
                continue;
            }

            buffer = match buffer {
                Some((lo, tokens)) if tokens + count > max_tokens => {
                    planned.push(PlannedChunk::packed(lo, i - 1, tokens));
                    Some((i, count))
                }
                Some((lo, tokens)) => Some((lo, tokens + count)),
                None => Some((i, count)),
            };
        }

        if let Some((lo, tokens)) = buffer {
            planned.push(PlannedChunk::packed(lo, segment.hi, tokens));
        }
    }

    planned
}

/// One left-to-right sweep: an undersized chunk absorbs its successor while the
/// result stays within budget. Oversized chunks never take part.
fn forward_merge(
    planned: Vec<PlannedChunk>,
    max_tokens: usize,
    fraction: f32,
) -> Vec<PlannedChunk> {
    let min_tokens = f64::from(fraction) * max_tokens as f64;
    let mut merged: Vec<PlannedChunk> = Vec::with_capacity(planned.len());

    for next in planned {
        if let Some(current) = merged.last_mut() {
            let undersized = (current.token_count as f64) < min_tokens;
            let fits = current.token_count + next.token_count <= max_tokens;
            if undersized && fits && !current.oversized && !next.oversized {
                current.segment.hi = next.segment.hi;
                current.token_count += next.token_count;
                continue;
            }
        }
        merged.push(next);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Candidate segments for `n` sentences with cuts after `cuts`.
    fn runs(n: usize, cuts: &[usize]) -> Vec<Segment> {
        let signal = BoundarySignal {
            distances: vec![0.0; n.saturating_sub(1)],
            threshold: 0.0,
            cuts: cuts.to_vec(),
        };
        signal.segments(n)
    }

    fn no_cuts(n: usize) -> Vec<Segment> {
        runs(n, &[])
    }

    fn all_cuts(n: usize) -> Vec<Segment> {
        runs(n, &(0..n.saturating_sub(1)).collect::<Vec<_>>())
    }

    fn segments(planned: &[PlannedChunk]) -> Vec<(usize, usize)> {
        planned.iter().map(|p| (p.segment.lo, p.segment.hi)).collect()
    }

    #[test]
    fn test_budget_split_without_cuts() {
        let planned = plan_chunks(&[50; 10], &no_cuts(10), &PackingPolicy::new(120));

        assert_eq!(planned.len(), 5);
        assert!(planned.iter().all(|p| p.token_count == 100));
        assert_eq!(segments(&planned)[0], (0, 1));
        assert_eq!(segments(&planned)[4], (8, 9));
    }

    #[test]
    fn test_semantic_cut_starts_new_chunk() {
        let planned = plan_chunks(&[10; 6], &runs(6, &[2]), &PackingPolicy::new(1000));
        assert_eq!(segments(&planned), vec![(0, 2), (3, 5)]);
    }

    #[test]
    fn test_exact_budget_fits() {
        let planned = plan_chunks(&[60, 40, 1], &no_cuts(3), &PackingPolicy::new(100));
        assert_eq!(segments(&planned), vec![(0, 1), (2, 2)]);
        assert_eq!(planned[0].token_count, 100);
    }

    #[test]
    fn test_oversized_sentence_is_singleton() {
        let planned = plan_chunks(&[10, 500, 10, 10], &no_cuts(4), &PackingPolicy::new(100));

        assert_eq!(segments(&planned), vec![(0, 0), (1, 1), (2, 3)]);
        assert!(!planned[0].oversized);
        assert!(planned[1].oversized);
        assert_eq!(planned[1].token_count, 500);
        assert!(!planned[2].oversized);
    }

    #[test]
    fn test_consecutive_oversized_sentences() {
        let planned = plan_chunks(&[300, 400], &no_cuts(2), &PackingPolicy::new(100));
        assert_eq!(segments(&planned), vec![(0, 0), (1, 1)]);
        assert!(planned.iter().all(|p| p.oversized));
    }

    #[test]
    fn test_merge_disabled_by_default() {
        let planned = plan_chunks(&[80, 5, 80], &all_cuts(3), &PackingPolicy::new(100));
        assert_eq!(planned.len(), 3);
    }

    #[test]
    fn test_forward_merge_absorbs_successor() {
        let policy = PackingPolicy::new(100).with_min_chunk_fraction(Some(0.2));
        // cuts after every sentence: [5] [5] [80] [30]
        let planned = plan_chunks(&[5, 5, 80, 30], &all_cuts(4), &policy);

        // 5 absorbs 5 -> 10, still undersized, absorbs 80 -> 90; 90 is not undersized.
        assert_eq!(segments(&planned), vec![(0, 2), (3, 3)]);
        assert_eq!(planned[0].token_count, 90);
    }

    #[test]
    fn test_forward_merge_respects_budget() {
        let policy = PackingPolicy::new(100).with_min_chunk_fraction(Some(0.5));
        let planned = plan_chunks(&[10, 95], &all_cuts(2), &policy);
        assert_eq!(segments(&planned), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_forward_merge_skips_oversized() {
        let policy = PackingPolicy::new(100).with_min_chunk_fraction(Some(0.5));
        let planned = plan_chunks(&[10, 400, 10], &all_cuts(3), &policy);
        assert_eq!(segments(&planned), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_segments_partition_input() {
        let counts = [12, 7, 33, 1, 90, 4, 4, 60, 250, 3];
        let policy = PackingPolicy::new(64).with_min_chunk_fraction(Some(0.3));
        let planned = plan_chunks(&counts, &runs(counts.len(), &[0, 3, 6]), &policy);

        let mut expected_lo = 0;
        for p in &planned {
            assert_eq!(p.segment.lo, expected_lo);
            let sum: usize = counts[p.segment.lo..=p.segment.hi].iter().sum();
            assert_eq!(sum, p.token_count);
            if !p.oversized {
                assert!(p.token_count <= 64);
            }
            expected_lo = p.segment.hi + 1;
        }
        assert_eq!(expected_lo, counts.len());
    }

    #[test]
    fn test_pack_chunks_slices_document() {
        let document = "One two.  Three four.\nFive.";
        let sentence = |text: &str, start: usize| Sentence {
            text: text.to_string(),
            start_offset: start,
            end_offset: start + text.len(),
            token_count: text.split_whitespace().count(),
            embedding: vec![1.0],
        };
        let sentences = vec![
            sentence("One two.", 0),
            sentence("Three four.", 10),
            sentence("Five.", 22),
        ];
        let signal = BoundarySignal {
            distances: vec![0.0, 1.0],
            threshold: 0.5,
            cuts: vec![1],
        };

        let chunks = pack_chunks(document, &sentences, &signal, &PackingPolicy::new(100));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id.value(), 1);
        assert_eq!(chunks[0].text, "One two.  Three four.");
        assert_eq!(chunks[0].token_count, 4);
        assert_eq!(chunks[1].id.value(), 2);
        assert_eq!(chunks[1].text, "Five.");
    }
}
