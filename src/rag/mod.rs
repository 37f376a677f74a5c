//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieves chunks from the PDF library and answers questions in one of
//! three modes:
//!
//! - `strict`: answer only from the retrieved context, or say it isn't there.
//! - `loose`: use the context but allow reasoning beyond it.
//! - `enhanced`: a strict answer reviewed and, if needed, rewritten by a second model call.

pub mod context;
mod response;

pub use context::Retriever;
pub use response::{RagEngine, RagResponse, NOT_IN_PDFS};

use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};

/// A retrieved chunk prepared for prompting and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    /// File name of the PDF.
    pub source: String,
    /// Position of the chunk within its PDF.
    pub chunk_id: usize,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            source: result.document.source,
            chunk_id: result.document.chunk_id,
            content: result.document.content,
            score: result.score,
        }
    }
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Source-grounded: only the retrieved context may be used.
    #[default]
    Strict,
    /// Inferential: the model may reason beyond the context.
    Loose,
    /// Strict answer followed by a self-review.
    Enhanced,
}

impl AnswerMode {
    pub const ALL: [AnswerMode; 3] = [AnswerMode::Strict, AnswerMode::Loose, AnswerMode::Enhanced];

    /// Heading printed above answers, e.g. `[STRICT MODE]`.
    pub fn banner(&self) -> String {
        format!("[{} MODE]", self.to_string().to_uppercase())
    }
}

impl std::str::FromStr for AnswerMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(AnswerMode::Strict),
            "loose" => Ok(AnswerMode::Loose),
            "enhanced" => Ok(AnswerMode::Enhanced),
            _ => Err(format!(
                "Invalid mode: {}. Use 'strict', 'loose' or 'enhanced'",
                s
            )),
        }
    }
}

impl std::fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerMode::Strict => write!(f, "strict"),
            AnswerMode::Loose => write!(f, "loose"),
            AnswerMode::Enhanced => write!(f, "enhanced"),
        }
    }
}

/// How candidate chunks are picked from the vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Top-k by cosine similarity.
    Similarity,
    /// Maximal marginal relevance over a larger candidate pool.
    Mmr,
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "similarity" => Ok(SearchType::Similarity),
            "mmr" => Ok(SearchType::Mmr),
            _ => Err(format!("Unknown search type: {}", s)),
        }
    }
}
