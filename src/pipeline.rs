//! Document-to-insight pipeline orchestration.
//!
//! Coordinates the full ingestion flow for one document: format extraction
//! → normalization → {entity extraction, summarization} → a fully
//! populated [`ProcessedDocument`] ready for persistence.
//!
//! The pipeline is single-document, single-pass, and stateless between
//! invocations; the only shared resource is the injected analyzer, which
//! is read-only and safe for concurrent use. Any stage failure aborts the
//! whole run: no partial record is ever handed to the store, and no stage
//! substitutes empty results for a failure.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::analyzer::{AnalysisError, TextAnalyzer};
use crate::extract::{self, ExtractError};
use crate::models::{Entity, Insights, ProcessedDocument};

/// A pipeline stage failure. Variants stay distinguishable so callers can
/// report rejected uploads, unreadable files, and analysis outages
/// differently.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Linguistic(#[from] AnalysisError),
}

/// Reduce text to a canonical token stream: stop words dropped, every
/// survivor replaced by its lemma, joined with single spaces. Token order
/// is preserved; nothing is deduplicated. Idempotent for text that is
/// already normalized.
pub async fn normalize(
    analyzer: &dyn TextAnalyzer,
    text: &str,
) -> Result<String, AnalysisError> {
    let analysis = analyzer.analyze(text).await?;
    let tokens: Vec<&str> = analysis
        .tokens
        .iter()
        .filter(|t| !t.is_stop)
        .map(|t| t.lemma.as_str())
        .collect();
    Ok(tokens.join(" "))
}

/// Recognized entities of `text` in document order of their spans. Every
/// entity the analyzer reports is retained, with no confidence threshold
/// and no dedup. Empty text yields an empty list.
pub async fn extract_entities(
    analyzer: &dyn TextAnalyzer,
    text: &str,
) -> Result<Vec<Entity>, AnalysisError> {
    Ok(analyzer.analyze(text).await?.entities)
}

/// Extractive prefix summary: the first `max_sentences` sentences of
/// `text`, verbatim, joined by single spaces. Texts with fewer sentences
/// return everything they have.
///
/// Known simplification: this is position-biased. Documents that open
/// with boilerplate or header text get an unrepresentative summary.
pub async fn summarize(
    analyzer: &dyn TextAnalyzer,
    text: &str,
    max_sentences: usize,
) -> Result<String, AnalysisError> {
    let analysis = analyzer.analyze(text).await?;
    let take = max_sentences.min(analysis.sentences.len());
    Ok(analysis.sentences[..take].join(" "))
}

/// The pipeline orchestrator. Holds the process-wide analyzer handle,
/// constructed once at startup and injected here.
pub struct Pipeline {
    analyzer: Arc<dyn TextAnalyzer>,
    max_summary_sentences: usize,
}

impl Pipeline {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>, max_summary_sentences: usize) -> Self {
        Self {
            analyzer,
            max_summary_sentences,
        }
    }

    pub fn analyzer(&self) -> &dyn TextAnalyzer {
        self.analyzer.as_ref()
    }

    /// Run the full pipeline over one stored file.
    ///
    /// Entity extraction and summarization both operate on the normalized
    /// output, as the normalizer keeps punctuation and leading
    /// capitalization intact. The caller persists the result exactly once,
    /// after this returns Ok; on Err it must also clean up the stored file
    /// it created.
    pub async fn run(
        &self,
        path: &Path,
        filename: &str,
        owner: &str,
    ) -> Result<ProcessedDocument, PipelineError> {
        let raw_text = extract::extract_text(path)?;
        let normalized_text = normalize(self.analyzer.as_ref(), &raw_text).await?;
        let entities = extract_entities(self.analyzer.as_ref(), &normalized_text).await?;
        let summary = summarize(
            self.analyzer.as_ref(),
            &normalized_text,
            self.max_summary_sentences,
        )
        .await?;

        Ok(ProcessedDocument {
            owner: owner.to_string(),
            filename: filename.to_string(),
            location: path.display().to_string(),
            raw_text,
            normalized_text,
            summary,
            insights: Insights { entities },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::english::EnglishAnalyzer;

    fn analyzer() -> EnglishAnalyzer {
        EnglishAnalyzer::new()
    }

    #[tokio::test]
    async fn normalized_text_has_no_stop_words_and_only_lemmas() {
        let a = analyzer();
        let out = normalize(&a, "The dogs were running in the park.").await.unwrap();
        assert_eq!(out, "dog run park .");
    }

    #[tokio::test]
    async fn normalize_is_idempotent() {
        let a = analyzer();
        let once = normalize(&a, "Dr. Smith was announcing the quarterly results. Studies agreed.")
            .await
            .unwrap();
        let twice = normalize(&a, &once).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn normalize_empty_and_all_stop_word_inputs() {
        let a = analyzer();
        assert_eq!(normalize(&a, "").await.unwrap(), "");
        assert_eq!(normalize(&a, "the of and is was").await.unwrap(), "");
    }

    #[tokio::test]
    async fn normalize_preserves_token_order_and_duplicates() {
        let a = analyzer();
        let out = normalize(&a, "cats chase cats chase mice").await.unwrap();
        assert_eq!(out, "cat chase cat chase mouse");
    }

    #[tokio::test]
    async fn summary_is_a_verbatim_sentence_prefix() {
        let a = analyzer();
        let text = "Alpha comes first. Beta follows. Gamma is third. Delta ends it.";
        let summary = summarize(&a, text, 3).await.unwrap();
        assert_eq!(summary, "Alpha comes first. Beta follows. Gamma is third.");
    }

    #[tokio::test]
    async fn short_texts_summarize_to_everything() {
        let a = analyzer();
        let text = "Only one sentence here.";
        assert_eq!(summarize(&a, text, 3).await.unwrap(), text);
        assert_eq!(summarize(&a, "", 3).await.unwrap(), "");
    }

    #[tokio::test]
    async fn entities_empty_on_empty_or_plain_input() {
        let a = analyzer();
        assert!(extract_entities(&a, "").await.unwrap().is_empty());
        assert!(extract_entities(&a, "nothing notable here").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pipeline_populates_every_derived_field() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("brief.txt");
        std::fs::write(
            &path,
            "Acme Corporation announced results on March 3, 2021. Revenue was strong. \
             Costs were falling. The outlook stays bright. Analysts were pleased.",
        )
        .unwrap();

        let pipeline = Pipeline::new(Arc::new(analyzer()), 3);
        let doc = pipeline.run(&path, "brief.txt", "erin").await.unwrap();

        assert_eq!(doc.owner, "erin");
        assert_eq!(doc.filename, "brief.txt");
        assert!(doc.raw_text.starts_with("Acme Corporation"));
        assert!(!doc.normalized_text.is_empty());
        // The summary is a prefix of the normalized token stream.
        assert!(doc.normalized_text.starts_with(&doc.summary));
        let labels: Vec<&str> = doc
            .insights
            .entities
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert!(labels.contains(&"ORG"));
        assert!(labels.contains(&"DATE"));
    }

    #[tokio::test]
    async fn unsupported_format_aborts_the_pipeline() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("binary.exe");
        std::fs::write(&path, b"MZ").unwrap();

        let pipeline = Pipeline::new(Arc::new(analyzer()), 3);
        let err = pipeline.run(&path, "binary.exe", "erin").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Extract(ExtractError::UnsupportedFormat(_))
        ));
    }
}
