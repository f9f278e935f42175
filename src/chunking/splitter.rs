//! Sentence splitting.
//!
//! Sentence bounds follow Unicode UAX #29, which treats every line break as a
//! sentence end. Hard-wrapped paragraphs are therefore split on a copy of the
//! document where line breaks inside a paragraph are blanked to spaces. The
//! copy has the same byte length, so its bounds index the original directly.
//! Blank lines still separate paragraphs.
//!
//! Whitespace around each bound is left out of the sentence but stays
//! addressable through the byte offsets.

use std::borrow::Cow;
use std::iter;

use unicode_segmentation::UnicodeSegmentation;

use super::error::ChunkingError;
use super::types::SentenceSpan;

/// Split a document into ordered, non-overlapping sentence spans.
///
/// Whitespace-only bounds are skipped. Fails with `EmptyDocument` when nothing
/// but whitespace remains. Span text is sliced from `document` itself, so a
/// sentence wrapped across lines keeps its original line breaks.
pub fn split_sentences(document: &str) -> Result<Vec<SentenceSpan>, ChunkingError> {
    let unwrapped = unwrap_lines(document);
    let mut spans = Vec::new();

    for (offset, bound) in unwrapped.split_sentence_bound_indices() {
        let trimmed = bound.trim();
        if trimmed.is_empty() {
            continue;
        }

        let leading = bound.len() - bound.trim_start().len();
        let start_offset = offset + leading;
        let end_offset = start_offset + trimmed.len();
        spans.push(SentenceSpan {
            text: document[start_offset..end_offset].to_string(),
            start_offset,
            end_offset,
        });
    }

    if spans.is_empty() {
        return Err(ChunkingError::EmptyDocument);
    }

    Ok(spans)
}

/// Blank the line terminator of every line that is followed by another
/// non-blank line. Only ASCII bytes are replaced, so offsets and char
/// boundaries are unchanged.
fn unwrap_lines(document: &str) -> Cow<'_, str> {
    if !document.contains('\n') {
        return Cow::Borrowed(document);
    }

    let lines: Vec<&str> = document.split_inclusive('\n').collect();
    let mut unwrapped = String::with_capacity(document.len());

    for (i, line) in lines.iter().enumerate() {
        let continues = !line.trim().is_empty()
            && lines.get(i + 1).is_some_and(|next| !next.trim().is_empty());
        if !continues {
            unwrapped.push_str(line);
            continue;
        }

        let body = line.trim_end_matches(['\r', '\n']);
        unwrapped.push_str(body);
        unwrapped.extend(iter::repeat_n(' ', line.len() - body.len()));
    }

    Cow::Owned(unwrapped)
}
