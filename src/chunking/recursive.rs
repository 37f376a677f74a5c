//! Recursive character chunking.
//!
//! Splits on the coarsest separator present (paragraphs, then lines, then
//! words, then characters), recursing only into pieces that are still too
//! long, and merges the pieces back into windows that share a short tail.

use super::{Chunker, ChunkingConfig, TextChunk};
use crate::error::Result;
use std::collections::VecDeque;
use tracing::warn;

const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Recursive character chunker.
pub struct RecursiveChunker {
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a chunker with the default paragraph/line/word/character separators.
    pub fn new() -> Self {
        Self {
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a chunker with custom separators, coarsest first.
    ///
    /// An empty separator is always appended so every piece can be split down
    /// to single characters.
    pub fn with_separators(separators: Vec<String>) -> Self {
        let mut separators = separators;
        if !separators.last().is_some_and(|s| s.is_empty()) {
            separators.push(String::new());
        }
        Self { separators }
    }

    /// Split `text`, which starts at character `base` of the source, into
    /// trimmed pieces that carry their own source offsets.
    fn split_text(
        &self,
        text: &str,
        base: usize,
        separators: &[String],
        config: &ChunkingConfig,
    ) -> Vec<Piece> {
        let mut separator = "";
        let mut remaining: &[String] = &[];

        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keeping_separator(text, separator);
        let mut finished = Vec::new();
        let mut pending: Vec<Piece> = Vec::new();
        let mut offset = base;

        for split in splits {
            let start = offset;
            let len = char_len(&split);
            offset += len;

            if len < config.chunk_size {
                pending.push(Piece { start, text: split });
                continue;
            }

            if !pending.is_empty() {
                finished.extend(merge_splits(&pending, config));
                pending.clear();
            }

            if remaining.is_empty() {
                finished.extend(trimmed_piece(start, &split));
            } else {
                finished.extend(self.split_text(&split, start, remaining, config));
            }
        }

        if !pending.is_empty() {
            finished.extend(merge_splits(&pending, config));
        }

        finished
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<TextChunk>> {
        config.validate()?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let chunks = self
            .split_text(text, 0, &self.separators, config)
            .into_iter()
            .enumerate()
            .map(|(i, piece)| TextChunk::new(piece.text, i, piece.start))
            .collect();

        Ok(chunks)
    }
}

/// A run of source text and the character offset where it begins.
#[derive(Debug)]
struct Piece {
    start: usize,
    text: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` on `separator`, keeping the separator at the start of each
/// following piece so joining the pieces restores the original text.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut splits = Vec::new();

    if let Some(first) = parts.next() {
        splits.push(first.to_string());
    }
    for part in parts {
        splits.push(format!("{}{}", separator, part));
    }

    splits.retain(|s| !s.is_empty());
    splits
}

/// Greedily merge adjacent pieces into chunks of at most `chunk_size`
/// characters, starting each new chunk with up to `chunk_overlap` characters
/// of the last.
fn merge_splits(splits: &[Piece], config: &ChunkingConfig) -> Vec<Piece> {
    let mut docs = Vec::new();
    let mut current: VecDeque<&Piece> = VecDeque::new();
    let mut total = 0usize;

    for split in splits {
        let len = char_len(&split.text);

        if total + len > config.chunk_size {
            if total > config.chunk_size {
                warn!(
                    "Created a chunk of size {}, which is longer than the specified {}",
                    total, config.chunk_size
                );
            }

            if !current.is_empty() {
                if let Some(doc) = join_trimmed(&current) {
                    docs.push(doc);
                }

                while total > config.chunk_overlap
                    || (total + len > config.chunk_size && total > 0)
                {
                    match current.pop_front() {
                        Some(front) => total -= char_len(&front.text),
                        None => break,
                    }
                }
            }
        }

        current.push_back(split);
        total += len;
    }

    if let Some(doc) = join_trimmed(&current) {
        docs.push(doc);
    }

    docs
}

/// Join contiguous pieces and trim the result, moving the start past any
/// leading whitespace.
fn join_trimmed(parts: &VecDeque<&Piece>) -> Option<Piece> {
    let start = parts.front()?.start;
    let joined: String = parts.iter().map(|p| p.text.as_str()).collect();
    trimmed_piece(start, &joined)
}

fn trimmed_piece(start: usize, text: &str) -> Option<Piece> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let leading = text.chars().take_while(|c| c.is_whitespace()).count();
    Some(Piece {
        start: start + leading,
        text: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = RecursiveChunker::new()
            .chunk("  The father of radiography.  ", &config(500, 50))
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "The father of radiography.");
        assert_eq!(chunks[0].chunk_id, 0);
        assert_eq!(chunks[0].start_offset, 2);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let text = "First paragraph about bones.\n\nSecond paragraph about X-rays.";
        let chunks = RecursiveChunker::new().chunk(text, &config(35, 0)).unwrap();

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["First paragraph about bones.", "Second paragraph about X-rays."]
        );
        assert_eq!(chunks[1].start_offset, 30);
    }

    #[test]
    fn test_word_split_with_overlap() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = RecursiveChunker::new().chunk(text, &config(15, 5)).unwrap();

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["one two three", "four five six", "six seven", "eight nine ten"]
        );
        assert!(chunks.iter().all(|c| c.char_len() <= 15));

        // "six" fits in the overlap budget and is carried into the next chunk.
        assert_eq!(chunks[2].start_offset, 24);
        assert_eq!(chunks[3].start_offset, 34);

        for word in text.split(' ') {
            assert!(chunks.iter().any(|c| c.content.contains(word)));
        }
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let text = "a".repeat(23);
        let chunks = RecursiveChunker::new().chunk(&text, &config(10, 2)).unwrap();

        assert!(chunks.iter().all(|c| c.char_len() <= 10));
        assert_eq!(chunks[0].content, "a".repeat(10));
        assert_eq!(chunks.len(), 3);

        let offsets: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(chunks[2].content, "a".repeat(7));
    }

    #[test]
    fn test_offsets_with_repeated_text() {
        let text = "ab ab ab ab ab ab ab ab";
        let chunks = RecursiveChunker::new().chunk(text, &config(8, 3)).unwrap();

        let mut previous = None;
        for chunk in &chunks {
            let located: String = text
                .chars()
                .skip(chunk.start_offset)
                .take(chunk.char_len())
                .collect();
            assert_eq!(located, chunk.content);
            if let Some(prev) = previous {
                assert!(chunk.start_offset > prev);
            }
            previous = Some(chunk.start_offset);
        }
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let text = "Roentgen discovered X-rays in 1895.\nHe won the first Nobel Prize in Physics.\n\nRadiography became a medical tool.";
        let chunks = RecursiveChunker::new().chunk(text, &config(40, 10)).unwrap();

        for pair in chunks.windows(2) {
            assert!(pair[1].start_offset >= pair[0].start_offset);
        }
        for chunk in &chunks {
            let located: String = text.chars().skip(chunk.start_offset).take(chunk.char_len()).collect();
            assert_eq!(located, chunk.content);
        }
    }

    #[test]
    fn test_whitespace_only_text() {
        let chunks = RecursiveChunker::new().chunk("\n\n  \n", &config(10, 2)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_custom_separators_gain_char_fallback() {
        let chunker = RecursiveChunker::with_separators(vec![". ".to_string()]);
        assert_eq!(chunker.separators.last().map(String::as_str), Some(""));
    }
}
