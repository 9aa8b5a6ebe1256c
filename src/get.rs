//! Document retrieval by id and by owner.
//!
//! Shared response shapes plus the `docsight get` and `docsight list`
//! commands. The HTTP server reuses the same shapes so both surfaces
//! return identical records.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::models::{Document, Insights};
use crate::store;

/// Fully populated document record as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub owner: String,
    pub filename: String,
    pub location: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub summary: String,
    pub insights: Insights,
    pub created_at: String, // ISO8601
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            owner: doc.owner,
            filename: doc.filename,
            location: doc.location,
            raw_text: doc.raw_text,
            normalized_text: doc.normalized_text,
            summary: doc.summary,
            insights: doc.insights,
            created_at: format_ts_iso(doc.created_at),
        }
    }
}

/// Fetch one document, or `None` when the id is unknown. Absence is an
/// expected outcome here, not an error.
pub async fn fetch_document(pool: &SqlitePool, id: &str) -> Result<Option<DocumentResponse>> {
    Ok(store::get_by_id(pool, id).await?.map(DocumentResponse::from))
}

/// All of `owner`'s documents, newest first.
pub async fn list_documents(pool: &SqlitePool, owner: &str) -> Result<Vec<DocumentResponse>> {
    let docs = store::list_by_owner(pool, owner).await?;
    Ok(docs.into_iter().map(DocumentResponse::from).collect())
}

/// CLI entry point — prints one full document to stdout.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let doc = fetch_document(&pool, id).await?;
    pool.close().await;

    let doc = match doc {
        Some(d) => d,
        None => {
            eprintln!("Error: document not found: {}", id);
            std::process::exit(1);
        }
    };

    println!("--- Document ---");
    println!("id:         {}", doc.id);
    println!("owner:      {}", doc.owner);
    println!("filename:   {}", doc.filename);
    println!("location:   {}", doc.location);
    println!("created_at: {}", doc.created_at);
    println!();

    println!("--- Summary ---");
    println!("{}", doc.summary);
    println!();

    println!("--- Entities ({}) ---", doc.insights.entities.len());
    for entity in &doc.insights.entities {
        println!("[{}] {}", entity.label, entity.text);
    }
    println!();

    println!("--- Normalized ---");
    println!("{}", doc.normalized_text);
    println!();

    println!("--- Raw ---");
    println!("{}", doc.raw_text);

    Ok(())
}

/// CLI entry point — prints the owner's documents as a table.
pub async fn run_list(config: &Config, owner: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let docs = list_documents(&pool, owner).await?;
    pool.close().await;

    if docs.is_empty() {
        println!("No documents for owner '{}'.", owner);
        return Ok(());
    }

    println!(
        "{:<36} {:<20} {:<28} {:>8}",
        "ID", "CREATED", "FILENAME", "ENTITIES"
    );
    println!("{}", "-".repeat(96));
    for doc in &docs {
        println!(
            "{:<36} {:<20} {:<28} {:>8}",
            doc.id,
            doc.created_at,
            doc.filename,
            doc.insights.entities.len()
        );
    }

    Ok(())
}

pub(crate) fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
