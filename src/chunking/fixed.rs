//! Fixed-size sliding window chunking.

use super::{Chunker, ChunkingConfig, TextChunk};
use crate::error::Result;

/// Sliding window chunker.
///
/// Emits windows of `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one.
pub struct FixedWindowChunker;

impl FixedWindowChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FixedWindowChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for FixedWindowChunker {
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<TextChunk>> {
        config.validate()?;

        let chars: Vec<char> = text.chars().collect();
        let step = config.chunk_size - config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + config.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();

            let leading = window.chars().take_while(|c| c.is_whitespace()).count();
            let trimmed = window.trim();

            if !trimmed.is_empty() {
                chunks.push(TextChunk::new(
                    trimmed.to_string(),
                    chunks.len(),
                    start + leading,
                ));
            }

            if end == chars.len() {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_overlap() {
        let text: String = ('a'..='z').collect();
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 3,
        };

        let chunks = FixedWindowChunker::new().chunk(&text, &config).unwrap();

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].content, "abcdefghij");
        assert_eq!(chunks[1].content, "hijklmnopq");
        assert_eq!(chunks[1].start_offset, 7);
        assert_eq!(chunks[3].content, "vwxyz");
        assert!(chunks.iter().enumerate().all(|(i, c)| c.chunk_id == i));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(25);
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 0,
        };

        let chunks = FixedWindowChunker::new().chunk(&text, &config).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.char_len() <= 10));
        assert_eq!(chunks[2].char_len(), 5);
    }

    #[test]
    fn test_blank_windows_are_dropped() {
        let text = format!("hello{}world", " ".repeat(20));
        let config = ChunkingConfig {
            chunk_size: 8,
            chunk_overlap: 0,
        };

        let chunks = FixedWindowChunker::new().chunk(&text, &config).unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "world"]);
        assert_eq!(chunks[1].chunk_id, 1);
        assert_eq!(chunks[1].start_offset, 25);
    }

    #[test]
    fn test_empty_text() {
        let chunks = FixedWindowChunker::new()
            .chunk("", &ChunkingConfig::default())
            .unwrap();
        assert!(chunks.is_empty());
    }
}
