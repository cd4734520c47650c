//! Grammar-check API client
//!
//! Thin wrapper over a LanguageTool-compatible checking endpoint. The
//! server proxies note text to the external API so the key stays
//! server-side, and forwards the findings to the client unchanged.

use serde::{Deserialize, Serialize};

/// Default public checking endpoint
const DEFAULT_API_BASE: &str = "https://api.languagetool.org/v2/check";

/// Default language variant submitted with every check
const DEFAULT_LANGUAGE: &str = "en-US";

/// Grammar API configuration loaded from environment
#[derive(Debug, Clone)]
pub struct GrammarConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub language: String,
}

impl GrammarConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("GRAMMAR_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            api_key: std::env::var("GRAMMAR_API_KEY").ok(),
            language: std::env::var("GRAMMAR_LANGUAGE")
                .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string()),
        }
    }
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Grammar client errors
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("Grammar API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Grammar API returned an error: {0}")]
    Upstream(String),
}

/// A suggested replacement for a flagged span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replacement {
    pub value: String,
}

/// Rule that produced a finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarRule {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// A single grammar finding in the submitted text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarMatch {
    pub message: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub rule: Option<GrammarRule>,
}

/// Full response from the checking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarReport {
    #[serde(default)]
    pub matches: Vec<GrammarMatch>,
}

/// Client for the grammar-check API
#[derive(Clone)]
pub struct GrammarClient {
    config: GrammarConfig,
    http: reqwest::Client,
}

impl GrammarClient {
    /// Create a new grammar client
    pub fn new(config: GrammarConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Submit text for checking and return the upstream findings
    pub async fn check(&self, text: &str) -> Result<GrammarReport, GrammarError> {
        let mut form = vec![
            ("text", text.to_string()),
            ("language", self.config.language.clone()),
        ];
        if let Some(key) = &self.config.api_key {
            form.push(("apiKey", key.clone()));
        }

        tracing::debug!("grammar check: {} bytes of text", text.len());

        let response = self
            .http
            .post(&self.config.api_base)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GrammarError::Upstream(format!("{}: {}", status, detail)));
        }

        let report = response.json::<GrammarReport>().await?;

        tracing::debug!("grammar check returned {} findings", report.matches.len());

        Ok(report)
    }
}
