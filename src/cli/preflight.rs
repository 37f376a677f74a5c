//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway through a run.

use crate::error::{FolioError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Indexing embeds every chunk, so it requires the API key.
    Index,
    /// Asking questions requires the API key.
    Ask,
    /// Search embeds the query, so it requires the API key.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Index | Operation::Ask | Operation::Search => check_api_key(),
    }
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    api_key_status(std::env::var("OPENAI_API_KEY").ok().as_deref())
}

fn api_key_status(key: Option<&str>) -> Result<()> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(FolioError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...' or add it to .env"
                .to_string(),
        )),
        None => Err(FolioError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...' or add it to .env"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_status() {
        assert!(api_key_status(Some("sk-test")).is_ok());

        let err = api_key_status(Some("  ")).unwrap_err();
        assert!(err.to_string().contains("empty"));

        let err = api_key_status(None).unwrap_err();
        assert!(err.to_string().contains("not set"));
    }
}
