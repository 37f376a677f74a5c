//! CLI module for Folio.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Folio - Ask questions about your PDFs
///
/// Indexes a folder of PDF files and answers questions from their content,
/// citing the files each answer came from.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Extract, chunk and index PDFs
    Index {
        /// Directory of PDFs, or a single PDF file (defaults to library.pdf_dir)
        path: Option<String>,

        /// Re-index files that are already in the index
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a question about your PDFs
    Ask {
        /// The question to ask
        question: String,

        /// Answer mode: strict, loose or enhanced (defaults to rag.default_mode)
        #[arg(long)]
        mode: Option<String>,

        /// LLM model to use for response generation
        #[arg(long)]
        model: Option<String>,

        /// Number of chunks retrieved as context (defaults to retrieval.k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Search for relevant passages without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,
    },

    /// List indexed PDFs
    List,

    /// Remove a PDF from the index
    Remove {
        /// File name of the PDF, as shown by `folio list`
        source: String,
    },

    /// Start the web UI and HTTP API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_mode() {
        let cli = Cli::try_parse_from([
            "folio", "ask", "Who discovered X-rays?", "--mode", "enhanced", "-k", "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask { question, mode, model, k } => {
                assert_eq!(question, "Who discovered X-rays?");
                assert_eq!(mode.as_deref(), Some("enhanced"));
                assert!(model.is_none());
                assert_eq!(k, Some(4));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_index_defaults() {
        let cli = Cli::try_parse_from(["folio", "-v", "index", "--force"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Commands::Index { path: None, force: true }
        ));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
