use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory where uploaded files are stored before processing.
    pub upload_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_max_summary_sentences")]
    pub max_summary_sentences: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_summary_sentences: default_max_summary_sentences(),
        }
    }
}

fn default_max_summary_sentences() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyzerConfig {
    #[serde(default = "default_analyzer_provider")]
    pub provider: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: default_analyzer_provider(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_analyzer_provider() -> String {
    "builtin".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate pipeline
    if config.pipeline.max_summary_sentences == 0 {
        anyhow::bail!("pipeline.max_summary_sentences must be > 0");
    }

    // Validate analyzer
    match config.analyzer.provider.as_str() {
        "builtin" => {}
        "remote" => {
            if config.analyzer.endpoint.is_none() {
                anyhow::bail!("analyzer.endpoint must be set when provider is 'remote'");
            }
        }
        other => anyhow::bail!(
            "Unknown analyzer provider: '{}'. Must be builtin or remote.",
            other
        ),
    }

    Ok(config)
}
