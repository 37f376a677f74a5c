//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.vector_store().list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No PDFs indexed yet. Use 'folio index <dir>' to add some.");
            } else {
                Output::header(&format!("Indexed PDFs ({})", sources.len()));
                println!();

                for item in &sources {
                    Output::source_info(&item.source, item.chunk_count, &item.indexed_at);
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total PDFs", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list PDFs: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
