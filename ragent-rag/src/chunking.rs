//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] — fixed character windows with an exact overlap
//! - [`SentenceChunker`] — windows that prefer to end on a sentence or word boundary
//!
//! Sizes are counted in characters (Unicode scalar values), never bytes, so a
//! chunk boundary can not fall inside a multi-byte code point. Both chunkers
//! skip windows that hold only whitespace and number the remaining chunks
//! densely from zero.

use crate::document::TextChunk;
use crate::error::{RagError, Result};

/// A strategy for splitting extracted document text into chunks.
///
/// Implementations are pure: the output depends only on the input text and
/// the configured size and overlap.
pub trait Chunker: Send + Sync {
    /// Split `text` into ordered chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoContentExtracted`] if `text` is empty or only
    /// whitespace. `source_id` is only used to label that error.
    fn chunk(&self, source_id: &str, text: &str) -> Result<Vec<TextChunk>>;
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// Every chunk except possibly the last holds exactly `chunk_size` characters,
/// and each chunk starts `chunk_size - chunk_overlap` characters after the
/// previous one. Splitting stops once a window reaches the end of the text, so
/// the final chunk is never wholly contained in its predecessor.
///
/// Windows that fall entirely inside a whitespace run are skipped. The chunks
/// on either side of a run longer than the step therefore do not overlap, and
/// indices stay sequential across the gap.
///
/// # Example
///
/// ```rust,ignore
/// use ragent_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(1000, 200);
/// let chunks = chunker.chunk("report.pdf", &text)?;
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of overlapping characters between consecutive chunks
    ///
    /// `chunk_overlap` is clamped below `chunk_size` so the window always advances.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, source_id: &str, text: &str) -> Result<Vec<TextChunk>> {
        ensure_content(source_id, text)?;

        // Byte offset of every character, plus the end of the string.
        let bounds: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_count = bounds.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            push_chunk(&mut chunks, &text[bounds[start]..bounds[end]]);
            if end == char_count {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }
}

/// Splits text into windows that end on a sentence or word boundary when one
/// is available in the second half of the window.
///
/// Boundaries are tried in order: sentence ends (`.`, `!`, `?` followed by
/// whitespace, or a newline), then any whitespace. If neither occurs, the
/// window is cut at `chunk_size` characters. The next chunk starts
/// `chunk_overlap` characters before the previous cut.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of characters repeated from the previous chunk
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// Find the cut position for the window `[start, end)`.
    fn find_cut(&self, chars: &[char], start: usize, end: usize) -> usize {
        let floor = start + self.chunk_size / 2;
        let sentence_end = |i: usize| {
            let after_terminator = i >= 2 && matches!(chars[i - 2], '.' | '!' | '?');
            chars[i - 1] == '\n' || (after_terminator && chars[i - 1].is_whitespace())
        };

        if let Some(cut) = (floor + 1..=end).rev().find(|&i| sentence_end(i)) {
            return cut;
        }
        if let Some(cut) = (floor + 1..=end).rev().find(|&i| chars[i - 1].is_whitespace()) {
            return cut;
        }
        end
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, source_id: &str, text: &str) -> Result<Vec<TextChunk>> {
        ensure_content(source_id, text)?;

        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            if end == chars.len() {
                push_chunk(&mut chunks, &chars[start..end].iter().collect::<String>());
                break;
            }

            let cut = self.find_cut(&chars, start, end);
            push_chunk(&mut chunks, &chars[start..cut].iter().collect::<String>());

            // Always advance, even when the overlap would reach back past `start`.
            let next = cut.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { cut };
        }

        Ok(chunks)
    }
}

fn ensure_content(source_id: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RagError::NoContentExtracted { source_id: source_id.to_string() });
    }
    Ok(())
}

/// Append a chunk with the next index. Whitespace-only windows carry nothing
/// to embed and are dropped.
fn push_chunk(chunks: &mut Vec<TextChunk>, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    chunks.push(TextChunk { index: chunks.len(), text: text.to_string() });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = FixedSizeChunker::new(1000, 200).chunk("doc", "tiny").unwrap();
        assert_eq!(chunks, vec![TextChunk { index: 0, text: "tiny".into() }]);
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = FixedSizeChunker::new(10, 2).chunk("doc", "  \n ").unwrap_err();
        assert!(
            matches!(err, RagError::NoContentExtracted { ref source_id } if source_id == "doc")
        );
    }

    #[test]
    fn whitespace_runs_are_skipped_without_gaps_in_indices() {
        let text = format!("{}{}{}", "a".repeat(10), " ".repeat(20), "b".repeat(10));
        let chunks = FixedSizeChunker::new(10, 2).chunk("doc", &text).unwrap();

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaaaaaaaa", "aa        ", "      bbbb", "bbbbbbbb"]);
        assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "é".repeat(25);
        let chunks = FixedSizeChunker::new(10, 2).chunk("doc", &text).unwrap();
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 10));
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn sentence_chunker_prefers_sentence_end() {
        let text = "First sentence here. Second sentence follows and runs long.";
        let chunks = SentenceChunker::new(30, 5).chunk("doc", text).unwrap();
        assert_eq!(chunks[0].text, "First sentence here. ");
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 30));
    }
}
