//! Context retrieval for RAG responses.

use super::{ContextChunk, SearchType};
use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{max_marginal_relevance, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Fetches the chunks most relevant to a query.
pub struct Retriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    search_type: SearchType,
    k: usize,
    fetch_k: usize,
    lambda_mult: f32,
    min_score: f32,
}

impl Retriever {
    /// Create a retriever with MMR over 20 candidates, returning 6.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            search_type: SearchType::Mmr,
            k: 6,
            fetch_k: 20,
            lambda_mult: 0.5,
            min_score: f32::MIN,
        }
    }

    /// Apply the `[retrieval]` config section.
    pub fn with_settings(self, settings: &RetrievalSettings) -> Self {
        let search_type = settings.search_type.parse().unwrap_or_else(|e| {
            warn!("{}, falling back to mmr", e);
            SearchType::Mmr
        });
        self.with_search_type(search_type)
            .with_k(settings.k)
            .with_fetch_k(settings.fetch_k)
            .with_lambda_mult(settings.lambda_mult)
            .with_min_score(settings.min_score)
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Set the number of chunks returned.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the MMR candidate pool size.
    pub fn with_fetch_k(mut self, fetch_k: usize) -> Self {
        self.fetch_k = fetch_k;
        self
    }

    pub fn with_lambda_mult(mut self, lambda_mult: f32) -> Self {
        self.lambda_mult = lambda_mult;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Retrieve context for a query.
    #[instrument(skip(self), fields(search_type = ?self.search_type, k = self.k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = match self.search_type {
            SearchType::Similarity => {
                self.vector_store
                    .search_with_threshold(&query_embedding, self.k, self.min_score)
                    .await?
            }
            SearchType::Mmr => {
                let candidates = self
                    .vector_store
                    .search_with_threshold(
                        &query_embedding,
                        self.fetch_k.max(self.k),
                        self.min_score,
                    )
                    .await?;
                max_marginal_relevance(&query_embedding, candidates, self.k, self.lambda_mult)
            }
        };

        debug!("Retrieved {} chunks", results.len());
        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Join chunk contents into the context block of a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct source file names, in first-seen order.
pub fn unique_sources(chunks: &[ContextChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for chunk in chunks {
        if !sources.contains(&chunk.source) {
            sources.push(chunk.source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::vector_store::{Document, MemoryVectorStore};
    use async_trait::async_trait;

    /// Embeds every text as a fixed vector keyed by its first word.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(match text.split_whitespace().next() {
                Some("xray") => vec![1.0, 0.0],
                _ => vec![0.0, 1.0],
            })
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    async fn store() -> Arc<dyn VectorStore> {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                Document::new("rad.pdf".to_string(), 0, "xray one".to_string(), vec![1.0, 0.0]),
                Document::new("rad.pdf".to_string(), 1, "xray two".to_string(), vec![0.99, 0.05]),
                Document::new("bone.pdf".to_string(), 0, "femur".to_string(), vec![0.5, 0.5]),
                Document::new("bone.pdf".to_string(), 1, "tibia".to_string(), vec![0.0, 1.0]),
            ])
            .await
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_similarity_retrieval() {
        let retriever = Retriever::new(store().await, Arc::new(KeywordEmbedder))
            .with_search_type(SearchType::Similarity)
            .with_k(2);

        let chunks = retriever.retrieve("xray history").await.unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["xray one", "xray two"]);
    }

    #[tokio::test]
    async fn test_mmr_retrieval_diversifies() {
        let retriever = Retriever::new(store().await, Arc::new(KeywordEmbedder))
            .with_k(2)
            .with_lambda_mult(0.3);

        let chunks = retriever.retrieve("xray history").await.unwrap();
        assert_eq!(chunks[0].content, "xray one");
        assert_ne!(chunks[1].content, "xray two");
    }

    #[tokio::test]
    async fn test_with_settings_search_type() {
        let mut settings = RetrievalSettings {
            search_type: "similarity".to_string(),
            ..RetrievalSettings::default()
        };
        let retriever = Retriever::new(store().await, Arc::new(KeywordEmbedder))
            .with_settings(&settings);
        assert_eq!(retriever.search_type, SearchType::Similarity);

        // A misspelled search type falls back to MMR instead of failing at query time.
        settings.search_type = "similarty".to_string();
        let retriever = Retriever::new(store().await, Arc::new(KeywordEmbedder))
            .with_settings(&settings);
        assert_eq!(retriever.search_type, SearchType::Mmr);
    }

    #[tokio::test]
    async fn test_min_score_filters_everything() {
        let retriever = Retriever::new(store().await, Arc::new(KeywordEmbedder))
            .with_min_score(1.5);
        assert!(retriever.retrieve("xray").await.unwrap().is_empty());
    }

    #[test]
    fn test_format_context_and_sources() {
        let chunks = vec![
            ContextChunk { source: "a.pdf".to_string(), chunk_id: 0, content: "first".to_string(), score: 0.9 },
            ContextChunk { source: "b.pdf".to_string(), chunk_id: 2, content: "second".to_string(), score: 0.8 },
            ContextChunk { source: "a.pdf".to_string(), chunk_id: 1, content: "third".to_string(), score: 0.7 },
        ];

        assert_eq!(format_context_for_prompt(&chunks), "first\n\nsecond\n\nthird");
        assert_eq!(unique_sources(&chunks), vec!["a.pdf", "b.pdf"]);
    }
}
