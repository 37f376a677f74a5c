//! Remove command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::FolioError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the remove command.
pub async fn run_remove(source: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let removed = orchestrator.remove_source(source).await?;
    if removed == 0 {
        Output::error(&format!("'{}' is not in the index", source));
        Output::info("Run 'folio list' to see indexed PDFs.");
        return Err(FolioError::SourceNotFound(source.to_string()).into());
    }

    Output::success(&format!("Removed {} ({} chunks)", source, removed));
    Ok(())
}
