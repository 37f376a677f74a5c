//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{AnswerMode, RagResponse};
use anyhow::Result;
use console::style;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    mode: Option<String>,
    model: Option<String>,
    k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    let mode: AnswerMode = mode
        .as_deref()
        .unwrap_or(&settings.rag.default_mode)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'folio doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(k) = k {
        settings.retrieval.k = k;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.rag_engine(model.as_deref());

    let spinner = Output::spinner("Searching your PDFs...");
    let result = engine.ask(question, mode).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => print_response(&response),
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_response(response: &RagResponse) {
    println!("\n{}", style(response.mode.banner()).bold());

    match &response.initial_answer {
        Some(initial) => {
            println!("\n{}", initial);
            Output::header("Review");
            println!("{}", response.answer);
        }
        None => println!("\n{}", response.answer),
    }

    let sources = response.source_names();
    if !sources.is_empty() {
        Output::header("Sources");
        for source in &sources {
            Output::list_item(source);
        }
    }
    println!();
}
