//! Ingestion command orchestration.
//!
//! Coordinates the full upload flow for the CLI: copy the file into
//! managed storage, run the pipeline, persist the result. The stored copy
//! is removed again if any pipeline stage fails, so a failed run leaves
//! neither a partial record nor an orphaned upload behind.

use anyhow::{bail, Context, Result};
use std::path::Path;
use uuid::Uuid;

use crate::analyzer::create_analyzer;
use crate::config::Config;
use crate::db;
use crate::pipeline::Pipeline;
use crate::store;

pub async fn run_ingest(config: &Config, file: &Path, owner: &str) -> Result<()> {
    if !file.is_file() {
        bail!("No such file: {}", file.display());
    }
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid filename: {}", file.display()))?
        .to_string();

    let analyzer = create_analyzer(&config.analyzer)?;
    let pipeline = Pipeline::new(analyzer, config.pipeline.max_summary_sentences);

    // Copy into managed storage first; the stored path becomes the
    // document's location.
    std::fs::create_dir_all(&config.storage.upload_dir).with_context(|| {
        format!(
            "Failed to create upload dir: {}",
            config.storage.upload_dir.display()
        )
    })?;
    let stored = config
        .storage
        .upload_dir
        .join(format!("{}-{}", Uuid::new_v4(), filename));
    std::fs::copy(file, &stored)
        .with_context(|| format!("Failed to store upload: {}", stored.display()))?;

    let processed = match pipeline.run(&stored, &filename, owner).await {
        Ok(doc) => doc,
        Err(e) => {
            let _ = std::fs::remove_file(&stored);
            return Err(e).with_context(|| format!("Processing failed for {}", filename));
        }
    };

    let pool = db::connect(config).await?;
    let id = match store::save_document(&pool, &processed).await {
        Ok(id) => id,
        Err(e) => {
            let _ = std::fs::remove_file(&stored);
            pool.close().await;
            return Err(e).context("Failed to persist document");
        }
    };
    pool.close().await;

    println!("ingest {}", filename);
    println!("  id:         {}", id);
    println!("  owner:      {}", owner);
    println!("  location:   {}", stored.display());
    println!("  raw chars:  {}", processed.raw_text.chars().count());
    println!("  summary:    {}", excerpt(&processed.summary, 96));
    println!("  entities:   {}", processed.insights.entities.len());
    println!("ok");

    Ok(())
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
