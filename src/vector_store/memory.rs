//! In-memory vector store implementation.
//!
//! Useful for testing and for one-off sessions that should not touch disk.

use super::{rank_documents, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{FolioError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<uuid::Uuid, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<uuid::Uuid, Document>>> {
        self.documents
            .read()
            .map_err(|e| FolioError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<uuid::Uuid, Document>>> {
        self.documents
            .write()
            .map_err(|e| FolioError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        self.write()?.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(doc.id, doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.read()?;
        Ok(rank_documents(
            docs.values().cloned(),
            query_embedding,
            limit,
            min_score,
        ))
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let mut docs = self.write()?;
        let initial_len = docs.len();
        docs.retain(|_, doc| doc.source != source);
        Ok(initial_len - docs.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let docs = self.read()?;

        let mut source_map: HashMap<String, IndexedSource> = HashMap::new();

        for doc in docs.values() {
            let entry = source_map
                .entry(doc.source.clone())
                .or_insert_with(|| IndexedSource {
                    source: doc.source.clone(),
                    chunk_count: 0,
                    indexed_at: doc.indexed_at,
                });

            entry.chunk_count += 1;
            if doc.indexed_at > entry.indexed_at {
                entry.indexed_at = doc.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| a.source.cmp(&b.source));

        Ok(sources)
    }

    async fn get_source(&self, source: &str) -> Result<Option<IndexedSource>> {
        let sources = self.list_sources().await?;
        Ok(sources.into_iter().find(|s| s.source == source))
    }

    async fn is_source_indexed(&self, source: &str) -> Result<bool> {
        Ok(self.read()?.values().any(|d| d.source == source))
    }

    async fn get_by_source(&self, source: &str) -> Result<Vec<Document>> {
        let docs = self.read()?;
        let mut result: Vec<Document> = docs
            .values()
            .filter(|d| d.source == source)
            .cloned()
            .collect();
        result.sort_by_key(|d| d.chunk_id);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
