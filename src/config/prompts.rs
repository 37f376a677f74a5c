//! Prompt templates for Folio.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    pub review: ReviewPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts used to answer a question from retrieved PDF context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    /// Source-grounded answering. Must refuse when the context is silent.
    pub strict: String,
    /// Inferential answering. May reason beyond the context.
    pub loose: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            strict: r#"You are a PDF assistant. Use ONLY the context below to answer the question.
If the answer is not in the context, respond with: "The answer is not provided in the PDFs"

Context:
{{context}}

Question:
{{question}}

Answer:"#
                .to_string(),

            loose: r#"You are a helpful assistant. Use the context below to answer the question as best as you can.
You can infer and reason using your own understanding, but do not make things up.

Context:
{{context}}

Question: {{question}}
Answer:"#
                .to_string(),
        }
    }
}

/// Prompt used by enhanced mode to review a strict answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPrompts {
    pub user: String,
}

impl Default for ReviewPrompts {
    fn default() -> Self {
        Self {
            user: r#"You are a helpful AI assistant.

Here is a question and its original answer based only on some context.

Question: {{question}}
Answer: {{answer}}

Does this answer directly address the question? If not, explain briefly and then rewrite the answer to be more helpful and complete, using your own understanding.
If it's already good, just say: "The answer is good."."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }

            let review_path = custom_path.join("review.toml");
            if review_path.exists() {
                let content = std::fs::read_to_string(&review_path)?;
                prompts.review = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// The template is scanned once, left to right. Substituted values are
    /// copied verbatim and never rescanned, so placeholders inside retrieved
    /// text or a question stay literal. Unknown placeholders are kept as is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];

            let value = after
                .find("}}")
                .and_then(|close| vars.get(&after[..close]).map(|v| (close, v)));
            match value {
                Some((close, value)) => {
                    result.push_str(value);
                    rest = &after[close + 2..];
                }
                None => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
