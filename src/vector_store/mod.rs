//! Vector store abstraction for Folio.
//!
//! Provides a trait-based interface for different vector database backends.

mod memory;
mod mmr;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use mmr::max_marginal_relevance;
pub use sqlite::SqliteVectorStore;

use crate::config::Settings;
use crate::error::{FolioError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A chunk of a PDF stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// File name of the PDF this chunk came from.
    pub source: String,
    /// Position of the chunk within its PDF.
    pub chunk_id: usize,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document.
    pub fn new(source: String, chunk_id: usize, content: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            chunk_id,
            content,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// File name of the PDF.
    pub source: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// When the PDF was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document with its embedding.
    async fn upsert(&self, doc: &Document) -> Result<()>;

    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for similar documents.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Delete all chunks of a PDF.
    async fn delete_by_source(&self, source: &str) -> Result<usize>;

    /// List all indexed PDFs.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Get a specific PDF's information.
    async fn get_source(&self, source: &str) -> Result<Option<IndexedSource>>;

    /// Check if a PDF is indexed.
    async fn is_source_indexed(&self, source: &str) -> Result<bool>;

    /// Get all chunks of a PDF, ordered by chunk id.
    async fn get_by_source(&self, source: &str) -> Result<Vec<Document>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Open the vector store named by `[vector_store].provider`.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(FolioError::Config(format!(
            "Unknown vector store provider: {} (expected sqlite or memory)",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score, filter, sort and truncate documents against a query embedding.
pub(crate) fn rank_documents<I>(
    docs: I,
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Document>,
{
    let mut results: Vec<SearchResult> = docs
        .into_iter()
        .map(|doc| {
            let score = cosine_similarity(query_embedding, &doc.embedding);
            SearchResult {
                document: doc,
                score,
            }
        })
        .filter(|r| r.score >= min_score)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}
