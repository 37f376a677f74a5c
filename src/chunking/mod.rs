//! Content chunking strategies for breaking extracted text into searchable pieces.
//!
//! Both strategies produce overlapping windows measured in characters, so a
//! sentence cut at a chunk boundary still appears whole in one of its neighbours.

mod fixed;
mod recursive;

pub use fixed::FixedWindowChunker;
pub use recursive::RecursiveChunker;

use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};

/// A chunk of text from a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk within its document, starting at 0.
    pub chunk_id: usize,
    /// Character offset of the chunk in the source text.
    pub start_offset: usize,
}

impl TextChunk {
    pub fn new(content: String, chunk_id: usize, start_offset: usize) -> Self {
        Self {
            content,
            chunk_id,
            start_offset,
        }
    }

    /// Length of this chunk in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Split on paragraph, line, then word boundaries before merging.
    Recursive,
    /// Plain sliding window over characters.
    Fixed,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(ChunkingStrategy::Recursive),
            "fixed" | "window" => Ok(ChunkingStrategy::Fixed),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkingStrategy::Recursive => write!(f, "recursive"),
            ChunkingStrategy::Fixed => write!(f, "fixed"),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// Reject sizes that would never make progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FolioError::InvalidInput(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(FolioError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Trait for content chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split a document's text into chunks.
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<TextChunk>>;
}

/// Create a chunker based on the strategy.
pub fn create_chunker(strategy: ChunkingStrategy) -> Box<dyn Chunker> {
    match strategy {
        ChunkingStrategy::Recursive => Box::new(RecursiveChunker::new()),
        ChunkingStrategy::Fixed => Box::new(FixedWindowChunker::new()),
    }
}
