//! Folio - Ask questions about your PDFs
//!
//! A local-first CLI tool that indexes a folder of PDF files and answers
//! questions from their content, citing the files each answer came from.
//!
//! # Overview
//!
//! Folio allows you to:
//! - Extract text from PDFs and split it into overlapping chunks
//! - Build a searchable vector index of those chunks
//! - Ask questions in strict, loose or enhanced (self-reviewed) mode
//! - Browse answers and sources in a two-panel web UI
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `extract` - PDF text extraction
//! - `chunking` - Fixed-window and recursive chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction with MMR re-ranking
//! - `llm` - Chat completion models
//! - `rag` - Retrieval and answer generation
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use folio::config::Settings;
//! use folio::orchestrator::Orchestrator;
//! use folio::rag::AnswerMode;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.index_directory("papers".as_ref(), false).await?;
//!     println!("Indexed {} chunks", report.chunks_indexed);
//!
//!     let engine = orchestrator.rag_engine(None);
//!     let response = engine.ask("Who is the father of radiography?", AnswerMode::Strict).await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_store;

pub use error::{FolioError, Result};
