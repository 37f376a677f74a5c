//! Doctor command - verify configuration and local state.

use crate::cli::Output;
use crate::config::Settings;
use crate::extract::is_pdf;
use crate::vector_store::open_store;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(config_path: &Path, settings: &Settings) -> anyhow::Result<()> {
    Output::header("Folio Doctor");
    println!();
    println!("Checking configuration and local state...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_check = check_openai_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref());
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Index").bold());
    let db_check = check_database(settings).await;
    db_check.print();
    checks.push(db_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Folio.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Folio is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key(key: Option<&str>) -> CheckResult {
    const HINT: &str = "Set with: export OPENAI_API_KEY='sk-...' or add it to .env";

    match key.map(str::trim) {
        Some(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(key)))
        }
        Some("") => CheckResult::error("OPENAI_API_KEY", "empty", HINT),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error("OPENAI_API_KEY", "not set", HINT),
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check data and PDF directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    results.push(check_pdf_dir(&settings.pdf_dir()));
    results
}

fn check_pdf_dir(pdf_dir: &Path) -> CheckResult {
    let entries = match std::fs::read_dir(pdf_dir) {
        Ok(entries) => entries,
        Err(_) => {
            return CheckResult::warning(
                "PDF directory",
                &format!("{} (not found)", pdf_dir.display()),
                "Create it and add PDFs, or pass a directory to 'folio index'",
            )
        }
    };

    let count = entries
        .filter_map(|e| e.ok())
        .filter(|e| is_pdf(&e.path()))
        .count();

    if count == 0 {
        CheckResult::warning(
            "PDF directory",
            &format!("{} (no PDFs)", pdf_dir.display()),
            "Copy some PDF files into it",
        )
    } else {
        CheckResult::ok("PDF directory", &format!("{} ({} PDFs)", pdf_dir.display(), count))
    }
}

/// Check that the vector store opens and report its contents.
async fn check_database(settings: &Settings) -> CheckResult {
    let store = match open_store(settings) {
        Ok(store) => store,
        Err(e) => {
            return CheckResult::error(
                "Vector store",
                &e.to_string(),
                "Check [vector_store] in your config",
            )
        }
    };

    let sources = store.list_sources().await.map(|s| s.len());
    let chunks = store.document_count().await;

    match (sources, chunks) {
        (Ok(0), _) => CheckResult::warning(
            "Vector store",
            &format!("{} (empty)", settings.vector_store.provider),
            "Run 'folio index' to add PDFs",
        ),
        (Ok(sources), Ok(chunks)) => {
            let location = if settings.vector_store.provider == "sqlite" {
                let size = std::fs::metadata(settings.sqlite_path())
                    .map(|m| format_size(m.len()))
                    .unwrap_or_else(|_| "unknown size".to_string());
                format!("{} ({})", settings.sqlite_path().display(), size)
            } else {
                settings.vector_store.provider.clone()
            };
            CheckResult::ok(
                "Vector store",
                &format!("{}: {} PDFs, {} chunks", location, sources, chunks),
            )
        }
        (Err(e), _) | (_, Err(e)) => CheckResult::error(
            "Vector store",
            &e.to_string(),
            "The index may be corrupt; delete it and re-run 'folio index'",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: folio config edit",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_api_key_checks() {
        let ok = check_openai_api_key(Some("sk-abcdefghijklmnopqrstuvwxyz"));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert_eq!(ok.message, "configured (sk-abcd...wxyz)");

        assert_eq!(check_openai_api_key(Some("")).status, CheckStatus::Error);
        assert_eq!(check_openai_api_key(Some("token")).status, CheckStatus::Warning);
        assert_eq!(check_openai_api_key(None).status, CheckStatus::Error);
    }

    #[test]
    fn test_pdf_dir_check() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_pdf_dir(dir.path()).status, CheckStatus::Warning);

        std::fs::write(dir.path().join("paper.PDF"), b"%PDF").unwrap();
        let check = check_pdf_dir(dir.path());
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(check.message.ends_with("(1 PDFs)"));

        assert_eq!(check_pdf_dir(&dir.path().join("missing")).status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_database_check_on_empty_memory_store() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();
        assert_eq!(check_database(&settings).await.status, CheckStatus::Warning);

        settings.vector_store.provider = "qdrant".to_string();
        assert_eq!(check_database(&settings).await.status, CheckStatus::Error);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }
}
