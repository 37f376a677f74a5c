//! Configuration module for Folio.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, ReviewPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LibrarySettings, PromptSettings,
    RagSettings, RetrievalSettings, Settings, VectorStoreSettings,
};
