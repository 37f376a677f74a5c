//! Folio CLI entry point.

use anyhow::Result;
use clap::Parser;
use folio::cli::{commands, Cli, Commands};
use folio::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // OPENAI_API_KEY may live in a .env file next to the PDFs
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("folio={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&config_path, &settings).await?;
        }

        Commands::Index { path, force } => {
            commands::run_index(path.as_deref(), *force, settings).await?;
        }

        Commands::Ask {
            question,
            mode,
            model,
            k,
        } => {
            commands::run_ask(question, mode.clone(), model.clone(), *k, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
        } => {
            commands::run_search(query, *limit, *min_score, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Remove { source } => {
            commands::run_remove(source, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &config_path, settings)?;
        }
    }

    Ok(())
}
