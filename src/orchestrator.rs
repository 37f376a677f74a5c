//! Pipeline orchestrator for Folio.
//!
//! Coordinates the indexing pipeline (extract, chunk, embed, store) and
//! builds the RAG engine used to answer questions.

use crate::chunking::{create_chunker, ChunkingConfig, ChunkingStrategy, TextChunk};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{FolioError, Result};
use crate::extract::{
    extract_directory, extract_file, is_pdf, source_name, ExtractedDocument, PdfExtractor,
    SkippedFile, TextExtractor,
};
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::rag::{RagEngine, Retriever, SearchType};
use crate::vector_store::{open_store, Document, VectorStore};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Folio pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Create a new orchestrator from configuration.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        if settings.embedding.provider != "openai" {
            return Err(FolioError::Config(format!(
                "Unknown embedding provider: {} (expected openai)",
                settings.embedding.provider
            )));
        }

        settings
            .retrieval
            .search_type
            .parse::<SearchType>()
            .map_err(FolioError::Config)?;

        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding));
        let vector_store = open_store(&settings)?;

        Ok(Self {
            settings,
            prompts,
            extractor: Arc::new(PdfExtractor::new()),
            embedder,
            vector_store,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            extractor,
            embedder,
            vector_store,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Extract, chunk, embed and index every PDF directly inside `dir`.
    ///
    /// Sources that are already indexed are left alone unless `force` is set.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn index_directory(&self, dir: &Path, force: bool) -> Result<IndexReport> {
        let extraction = extract_directory(
            self.extractor.as_ref(),
            dir,
            self.settings.library.max_concurrent_extractions,
        )
        .await?;

        let mut report = IndexReport {
            skipped: extraction.skipped,
            ..IndexReport::default()
        };

        for doc in &extraction.documents {
            self.index_document(doc, force, &mut report).await?;
        }

        info!(
            "Indexed {} chunks from {} PDFs ({} skipped, {} already indexed)",
            report.chunks_indexed,
            report.loaded.len(),
            report.skipped.len(),
            report.already_indexed.len()
        );

        Ok(report)
    }

    /// Index a single PDF file.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn index_file(&self, path: &Path, force: bool) -> Result<IndexReport> {
        if !is_pdf(path) {
            return Err(FolioError::InvalidInput(format!(
                "Not a PDF file: {}",
                path.display()
            )));
        }

        let mut report = IndexReport::default();

        match extract_file(self.extractor.as_ref(), path).await {
            Ok(doc) => self.index_document(&doc, force, &mut report).await?,
            Err(e @ FolioError::InvalidInput(_)) => return Err(e),
            Err(e) => {
                warn!("Skipped (unreadable): {}: {}", source_name(path), e);
                report.skipped.push(SkippedFile {
                    source: source_name(path),
                    reason: e.to_string(),
                });
            }
        }

        Ok(report)
    }

    async fn index_document(
        &self,
        doc: &ExtractedDocument,
        force: bool,
        report: &mut IndexReport,
    ) -> Result<()> {
        if !force && self.vector_store.is_source_indexed(&doc.source).await? {
            info!("{} is already indexed, skipping", doc.source);
            report.already_indexed.push(doc.source.clone());
            return Ok(());
        }

        let chunks = self.chunk_document(doc)?;
        if chunks.is_empty() {
            report.skipped.push(SkippedFile {
                source: doc.source.clone(),
                reason: "no text".to_string(),
            });
            return Ok(());
        }

        let indexed = self.index_chunks(&doc.source, chunks).await?;
        report.chunks_indexed += indexed;
        report.loaded.push(IndexedFile {
            source: doc.source.clone(),
            chunks: indexed,
        });
        Ok(())
    }

    fn chunk_document(&self, doc: &ExtractedDocument) -> Result<Vec<TextChunk>> {
        let strategy: ChunkingStrategy =
            self.settings.chunking.strategy.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to recursive", e);
                ChunkingStrategy::Recursive
            });

        let config = ChunkingConfig {
            chunk_size: self.settings.chunking.chunk_size,
            chunk_overlap: self.settings.chunking.chunk_overlap,
        };
        config.validate()?;

        create_chunker(strategy).chunk(&doc.content, &config)
    }

    /// Generate embeddings and replace the source's documents.
    async fn index_chunks(&self, source: &str, chunks: Vec<TextChunk>) -> Result<usize> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(FolioError::Embedding(format!(
                "Expected {} embeddings for {}, got {}",
                chunks.len(),
                source,
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                Document::new(source.to_string(), chunk.chunk_id, chunk.content, embedding)
            })
            .collect();

        self.vector_store.delete_by_source(source).await?;
        self.vector_store.upsert_batch(&documents).await
    }

    /// Remove every chunk of a source from the index.
    #[instrument(skip(self))]
    pub async fn remove_source(&self, source: &str) -> Result<usize> {
        self.vector_store.delete_by_source(source).await
    }

    /// Build a retriever from the `[retrieval]` settings.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.vector_store.clone(), self.embedder.clone())
            .with_settings(&self.settings.retrieval)
    }

    /// Build a RAG engine backed by OpenAI chat models.
    ///
    /// `model_override` replaces the answering model; the review model always
    /// comes from settings.
    pub fn rag_engine(&self, model_override: Option<&str>) -> RagEngine {
        let rag = &self.settings.rag;
        let answer_model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::new(
            model_override.unwrap_or(&rag.model),
            rag.temperature,
        ));
        let review_model: Arc<dyn ChatModel> =
            Arc::new(OpenAIChatModel::new(&rag.review_model, rag.temperature));

        self.rag_engine_with_models(answer_model, review_model)
    }

    /// Build a RAG engine with the given models.
    pub fn rag_engine_with_models(
        &self,
        answer_model: Arc<dyn ChatModel>,
        review_model: Arc<dyn ChatModel>,
    ) -> RagEngine {
        RagEngine::new(self.retriever(), answer_model, review_model)
            .with_prompts(self.prompts.clone())
    }
}

/// A PDF that was indexed during a run.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedFile {
    pub source: String,
    pub chunks: usize,
}

/// Result of an indexing run.
#[derive(Debug, Default, Serialize)]
pub struct IndexReport {
    /// PDFs indexed in this run.
    pub loaded: Vec<IndexedFile>,
    /// PDFs with no text or that could not be parsed.
    pub skipped: Vec<SkippedFile>,
    /// PDFs left untouched because they were indexed before.
    pub already_indexed: Vec<String>,
    /// Total chunks written.
    pub chunks_indexed: usize,
}
