//! System prompt template
//!
//! The capability description and few-shot examples live in a Markdown file
//! rendered with handlebars. Variables: `query`, `today` (YYYY-MM-DD).

use chrono::{NaiveDate, Utc};
use handlebars::Handlebars;
use serde_json::json;
use std::path::Path;

use crate::error::{ConfigError, RouterError};

const TEMPLATE_NAME: &str = "router_system";

/// Built-in router prompt
pub const DEFAULT_TEMPLATE: &str = include_str!("prompts/router_system.md");

/// Compiled router prompt
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    handlebars: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile a template from source
    pub fn new(source: &str) -> Result<Self, ConfigError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| ConfigError::Invalid(format!("prompt template: {}", e)))?;
        Ok(Self { handlebars })
    }

    /// The embedded router prompt
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_TEMPLATE)
    }

    /// Load a replacement template from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::new(&source)
    }

    /// Render for a query, dated today
    pub fn render(&self, query: &str) -> Result<String, RouterError> {
        self.render_on(query, Utc::now().date_naive())
    }

    /// Render for a query as of `today`
    pub fn render_on(&self, query: &str, today: NaiveDate) -> Result<String, RouterError> {
        let data = json!({
            "query": query,
            "today": today.format("%Y-%m-%d").to_string(),
        });
        self.handlebars
            .render(TEMPLATE_NAME, &data)
            .map_err(|e| RouterError::Prompt {
                message: e.to_string(),
            })
    }
}
