//! Linguistic-analysis capability: contract and providers.
//!
//! The pipeline consumes language analysis through the [`TextAnalyzer`]
//! trait: tokenization with per-token lemma and stop-word flag, sentence
//! segmentation, and named-entity recognition. Two providers implement it:
//!
//! - **[`english::EnglishAnalyzer`]** — deterministic rule-based English
//!   analysis, fully local (`provider = "builtin"`).
//! - **[`RemoteAnalyzer`]** — an HTTP JSON analysis service, with
//!   exponential-backoff retry for transient failures
//!   (`provider = "remote"`).
//!
//! An analyzer is constructed once at process startup via
//! [`create_analyzer`], wrapped in an `Arc`, and shared read-only across
//! concurrent pipeline invocations. Reconstructing it per request is
//! explicitly avoided.
//!
//! # Retry Strategy (remote provider)
//!
//! - HTTP 429 and 5xx → retry with backoff (1s, 2s, 4s, ... capped at 2^5)
//! - other 4xx → fail immediately
//! - network errors → retry
//!
//! Exhausted retries surface as [`AnalysisError`]. The caller decides
//! whether to retry the whole pipeline; no stage substitutes empty results.

pub mod english;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AnalyzerConfig;
use crate::models::Entity;

/// Failure of the linguistic-analysis capability: unavailable service,
/// malformed response, exhausted retries. Treated as transient
/// infrastructure failure and propagated, never masked.
#[derive(Debug, Error)]
#[error("linguistic analysis failed: {0}")]
pub struct AnalysisError(pub String);

/// One token of the input text with its dictionary base form and
/// stop-word classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub is_stop: bool,
}

/// Full analysis of one text: token stream, sentence slices (verbatim,
/// in order), and recognized entities (document order, no filtering).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub sentences: Vec<String>,
    pub entities: Vec<Entity>,
}

/// The linguistic-analysis contract consumed by the pipeline.
///
/// Implementations must be safe for concurrent read-only use: one
/// instance is shared across all in-flight pipeline invocations.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    /// Provider identifier (e.g. `"builtin"`), used in logs and health output.
    fn name(&self) -> &str;

    /// Analyze `text`. Empty input yields an empty [`Analysis`], not an error.
    async fn analyze(&self, text: &str) -> Result<Analysis, AnalysisError>;
}

/// Create the analyzer selected by configuration.
///
/// | Config value | Provider |
/// |--------------|----------|
/// | `"builtin"`  | [`english::EnglishAnalyzer`] |
/// | `"remote"`   | [`RemoteAnalyzer`] (requires `analyzer.endpoint`) |
pub fn create_analyzer(config: &AnalyzerConfig) -> Result<Arc<dyn TextAnalyzer>> {
    match config.provider.as_str() {
        "builtin" => Ok(Arc::new(english::EnglishAnalyzer::new())),
        "remote" => Ok(Arc::new(RemoteAnalyzer::new(config)?)),
        other => bail!("Unknown analyzer provider: '{}'. Must be builtin or remote.", other),
    }
}

// ============ Remote Provider ============

/// Analyzer backed by an HTTP JSON analysis service.
///
/// Calls `POST {endpoint}/analyze` with `{"text": ...}` and expects the
/// [`Analysis`] shape back. The HTTP client is built once with the
/// configured timeout.
pub struct RemoteAnalyzer {
    endpoint: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

impl RemoteAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("analyzer.endpoint required for remote provider"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl TextAnalyzer for RemoteAnalyzer {
    fn name(&self) -> &str {
        "remote"
    }

    async fn analyze(&self, text: &str) -> Result<Analysis, AnalysisError> {
        let url = format!("{}/analyze", self.endpoint);
        let body = AnalyzeRequest { text };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self.client.post(&url).json(&body).send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json::<Analysis>()
                            .await
                            .map_err(|e| AnalysisError(format!("invalid response: {}", e)));
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(format!("service error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(AnalysisError(format!(
                        "service error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    last_err = Some(e.to_string());
                    continue;
                }
            }
        }

        Err(AnalysisError(last_err.unwrap_or_else(|| {
            "analysis failed after retries".to_string()
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer_config(provider: &str) -> AnalyzerConfig {
        AnalyzerConfig {
            provider: provider.to_string(),
            endpoint: None,
            timeout_secs: 5,
            max_retries: 0,
        }
    }

    #[test]
    fn builtin_provider_constructs() {
        let analyzer = create_analyzer(&analyzer_config("builtin")).unwrap();
        assert_eq!(analyzer.name(), "builtin");
    }

    #[test]
    fn remote_provider_requires_endpoint() {
        let err = create_analyzer(&analyzer_config("remote")).err().unwrap();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = create_analyzer(&analyzer_config("spacy")).err().unwrap();
        assert!(err.to_string().contains("Unknown analyzer provider"));
    }
}
