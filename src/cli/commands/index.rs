//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{IndexReport, Orchestrator};
use anyhow::Result;
use std::path::Path;

/// Run the index command on a directory of PDFs or a single PDF.
pub async fn run_index(path: Option<&str>, force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index) {
        Output::error(&format!("{}", e));
        Output::info("Run 'folio doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let target = match path {
        Some(p) => Settings::expand_path(p),
        None => settings.pdf_dir(),
    };

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Indexing {}...", target.display()));
    let result = if target.is_file() {
        orchestrator.index_file(&target, force).await
    } else {
        orchestrator.index_directory(&target, force).await
    };
    spinner.finish_and_clear();

    match result {
        Ok(report) => print_report(&target, &report),
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_report(target: &Path, report: &IndexReport) {
    for file in &report.loaded {
        Output::success(&format!("Loaded: {} ({} chunks)", file.source, file.chunks));
    }
    for source in &report.already_indexed {
        Output::info(&format!("Already indexed: {} (use --force to re-index)", source));
    }
    for skipped in &report.skipped {
        Output::warning(&format!("Skipped ({}): {}", skipped.reason, skipped.source));
    }

    if report.loaded.is_empty() && report.already_indexed.is_empty() {
        Output::warning(&format!("No PDFs with text found in {}", target.display()));
        return;
    }

    println!();
    Output::kv("PDFs indexed", &report.loaded.len().to_string());
    Output::kv("Chunks indexed", &report.chunks_indexed.to_string());
}
