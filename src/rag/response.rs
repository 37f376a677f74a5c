//! RAG response generation.

use super::context::{format_context_for_prompt, unique_sources};
use super::{AnswerMode, ContextChunk, Retriever};
use crate::config::Prompts;
use crate::error::{FolioError, Result};
use crate::llm::ChatModel;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Strict-mode reply when the library holds nothing relevant.
pub const NOT_IN_PDFS: &str = "The answer is not provided in the PDFs";

/// RAG engine for question answering.
pub struct RagEngine {
    retriever: Retriever,
    answer_model: Arc<dyn ChatModel>,
    review_model: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl RagEngine {
    /// Create a new RAG engine. `review_model` is only used in enhanced mode.
    pub fn new(
        retriever: Retriever,
        answer_model: Arc<dyn ChatModel>,
        review_model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            retriever,
            answer_model,
            review_model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Override the number of chunks retrieved per question.
    pub fn with_k(mut self, k: usize) -> Self {
        self.retriever = self.retriever.with_k(k);
        self
    }

    /// Answer a question in the given mode.
    #[instrument(skip(self, question, mode), fields(question = %question, mode = %mode))]
    pub async fn ask(&self, question: &str, mode: AnswerMode) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(FolioError::InvalidInput("Question is empty".to_string()));
        }

        info!("Processing question in {} mode", mode);

        match mode {
            AnswerMode::Strict => self.ask_strict(question).await,
            AnswerMode::Loose => self.ask_loose(question).await,
            AnswerMode::Enhanced => self.ask_enhanced(question).await,
        }
    }

    async fn ask_strict(&self, question: &str) -> Result<RagResponse> {
        let sources = self.retriever.retrieve(question).await?;

        if sources.is_empty() {
            debug!("No context retrieved, skipping the model call");
            return Ok(RagResponse::new(AnswerMode::Strict, NOT_IN_PDFS.to_string(), sources));
        }

        let prompt = self.render_answer_prompt(&self.prompts.answer.strict, question, &sources);
        let answer = self.answer_model.complete(None, &prompt).await?;

        debug!("Generated strict answer with {} sources", sources.len());
        Ok(RagResponse::new(AnswerMode::Strict, answer, sources))
    }

    async fn ask_loose(&self, question: &str) -> Result<RagResponse> {
        let context = self.retriever.retrieve(question).await?;

        let prompt = self.render_answer_prompt(&self.prompts.answer.loose, question, &context);
        let answer = self.answer_model.complete(None, &prompt).await?;

        Ok(RagResponse::new(AnswerMode::Loose, answer, Vec::new()))
    }

    async fn ask_enhanced(&self, question: &str) -> Result<RagResponse> {
        let strict = self.ask_strict(question).await?;

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("answer".to_string(), strict.answer.clone());
        let review_prompt = self.prompts.render_with_custom(&self.prompts.review.user, &vars);

        let reviewed = self.review_model.complete(None, &review_prompt).await?;
        debug!("Reviewed answer with {}", self.review_model.model());

        Ok(RagResponse {
            mode: AnswerMode::Enhanced,
            answer: reviewed,
            initial_answer: Some(strict.answer),
            sources: strict.sources,
        })
    }

    fn render_answer_prompt(&self, template: &str, question: &str, context: &[ContextChunk]) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(context));
        self.prompts.render_with_custom(template, &vars)
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    /// Mode the question was answered in.
    pub mode: AnswerMode,
    /// The final answer (the review output in enhanced mode).
    pub answer: String,
    /// The strict answer that was reviewed, in enhanced mode.
    pub initial_answer: Option<String>,
    /// Source chunks used for the answer. Empty in loose mode.
    pub sources: Vec<ContextChunk>,
}

impl RagResponse {
    fn new(mode: AnswerMode, answer: String, sources: Vec<ContextChunk>) -> Self {
        Self {
            mode,
            answer,
            initial_answer: None,
            sources,
        }
    }

    /// Distinct PDF file names cited by this response.
    pub fn source_names(&self) -> Vec<String> {
        unique_sources(&self.sources)
    }

    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        let names = self.source_names();
        if !names.is_empty() {
            output.push_str("\n\nSources:");
            for name in names {
                output.push_str(&format!("\n - {}", name));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Records prompts and replies with a canned answer.
    struct RecordingModel {
        name: String,
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingModel {
        fn new(name: &str, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn complete(&self, _system: Option<&str>, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            &self.name
        }
    }

    async fn library(with_docs: bool) -> Arc<dyn VectorStore> {
        let store = MemoryVectorStore::new();
        if with_docs {
            store
                .upsert_batch(&[
                    Document::new(
                        "radiology.pdf".to_string(),
                        0,
                        "Wilhelm Roentgen is called the father of radiography.".to_string(),
                        vec![1.0, 0.0],
                    ),
                    Document::new(
                        "radiology.pdf".to_string(),
                        1,
                        "He discovered X-rays in 1895.".to_string(),
                        vec![0.9, 0.1],
                    ),
                ])
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn engine(
        store: Arc<dyn VectorStore>,
        answer: Arc<RecordingModel>,
        review: Arc<RecordingModel>,
    ) -> RagEngine {
        let retriever = Retriever::new(store, Arc::new(ConstantEmbedder));
        RagEngine::new(retriever, answer, review)
    }

    #[tokio::test]
    async fn test_strict_mode_uses_context_and_returns_sources() {
        let answer = RecordingModel::new("answer", "Wilhelm Roentgen.");
        let review = RecordingModel::new("review", "unused");
        let engine = engine(library(true).await, answer.clone(), review.clone());

        let response = engine
            .ask("Who is the father of radiography?", AnswerMode::Strict)
            .await
            .unwrap();

        assert_eq!(response.mode, AnswerMode::Strict);
        assert_eq!(response.answer, "Wilhelm Roentgen.");
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.source_names(), vec!["radiology.pdf"]);
        assert!(response.initial_answer.is_none());

        let prompts = answer.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Use ONLY the context"));
        assert!(prompts[0].contains("father of radiography."));
        assert!(prompts[0].contains("Who is the father of radiography?"));
        assert!(review.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_strict_mode_without_context_skips_model() {
        let answer = RecordingModel::new("answer", "should not be used");
        let review = RecordingModel::new("review", "unused");
        let engine = engine(library(false).await, answer.clone(), review);

        let response = engine.ask("Anything?", AnswerMode::Strict).await.unwrap();
        assert_eq!(response.answer, NOT_IN_PDFS);
        assert!(response.sources.is_empty());
        assert!(answer.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_loose_mode_returns_no_sources() {
        let answer = RecordingModel::new("answer", "Probably Roentgen.");
        let review = RecordingModel::new("review", "unused");
        let engine = engine(library(true).await, answer.clone(), review);

        let response = engine.ask("Who found X-rays?", AnswerMode::Loose).await.unwrap();
        assert_eq!(response.answer, "Probably Roentgen.");
        assert!(response.sources.is_empty());
        assert!(answer.prompts()[0].contains("infer and reason"));
        assert!(answer.prompts()[0].contains("He discovered X-rays in 1895."));
    }

    #[tokio::test]
    async fn test_loose_mode_still_asks_without_context() {
        let answer = RecordingModel::new("answer", "General knowledge answer.");
        let review = RecordingModel::new("review", "unused");
        let engine = engine(library(false).await, answer.clone(), review);

        let response = engine.ask("What is a femur?", AnswerMode::Loose).await.unwrap();
        assert_eq!(response.answer, "General knowledge answer.");
        assert_eq!(answer.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_enhanced_mode_reviews_strict_answer() {
        let answer = RecordingModel::new("answer", "Roentgen.");
        let review = RecordingModel::new("review", "The answer is good.");
        let engine = engine(library(true).await, answer.clone(), review.clone());

        let response = engine
            .ask("Who is the father of radiography?", AnswerMode::Enhanced)
            .await
            .unwrap();

        assert_eq!(response.mode, AnswerMode::Enhanced);
        assert_eq!(response.answer, "The answer is good.");
        assert_eq!(response.initial_answer.as_deref(), Some("Roentgen."));
        assert_eq!(response.sources.len(), 2);

        let review_prompts = review.prompts();
        assert_eq!(review_prompts.len(), 1);
        assert!(review_prompts[0].contains("Question: Who is the father of radiography?"));
        assert!(review_prompts[0].contains("Answer: Roentgen."));
    }

    #[tokio::test]
    async fn test_enhanced_mode_reviews_refusal_when_library_empty() {
        let answer = RecordingModel::new("answer", "unused");
        let review = RecordingModel::new("review", "Rewritten from general knowledge.");
        let engine = engine(library(false).await, answer.clone(), review.clone());

        let response = engine.ask("Who?", AnswerMode::Enhanced).await.unwrap();
        assert_eq!(response.initial_answer.as_deref(), Some(NOT_IN_PDFS));
        assert_eq!(response.answer, "Rewritten from general knowledge.");
        assert!(answer.prompts().is_empty());
        assert!(review.prompts()[0].contains(NOT_IN_PDFS));
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let engine = engine(
            library(true).await,
            RecordingModel::new("a", "x"),
            RecordingModel::new("r", "y"),
        );
        let err = engine.ask("   ", AnswerMode::Strict).await.unwrap_err();
        assert!(matches!(err, FolioError::InvalidInput(_)));
    }

    #[test]
    fn test_format_for_display_lists_each_source_once() {
        let chunk = |id| ContextChunk {
            source: "radiology.pdf".to_string(),
            chunk_id: id,
            content: String::new(),
            score: 1.0,
        };
        let response = RagResponse::new(AnswerMode::Strict, "Roentgen.".to_string(), vec![chunk(0), chunk(1)]);

        assert_eq!(
            response.format_for_display(),
            "Roentgen.\n\nSources:\n - radiology.pdf"
        );
    }
}
