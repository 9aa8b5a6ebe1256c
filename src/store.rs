//! Persistence collaborator for processed documents.
//!
//! The pipeline produces a value; this module owns getting it into and out
//! of SQLite. Writes happen exactly once, after the full pipeline has
//! succeeded. There is no partial or streaming persistence, and absence on
//! lookup is a value (`None`), not an error.

use anyhow::Result;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Document, Insights, ProcessedDocument};

/// Persist one processed document and return its assigned id.
pub async fn save_document(pool: &SqlitePool, doc: &ProcessedDocument) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().timestamp();
    let insights_json = serde_json::to_string(&doc.insights)?;

    let mut hasher = Sha256::new();
    hasher.update(doc.raw_text.as_bytes());
    let content_hash = format!("{:x}", hasher.finalize());

    sqlx::query(
        r#"
        INSERT INTO documents (id, owner, filename, location, raw_text, normalized_text, summary, insights_json, content_hash, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&doc.owner)
    .bind(&doc.filename)
    .bind(&doc.location)
    .bind(&doc.raw_text)
    .bind(&doc.normalized_text)
    .bind(&doc.summary)
    .bind(&insights_json)
    .bind(&content_hash)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(id)
}

/// All documents belonging to `owner`, newest first.
pub async fn list_by_owner(pool: &SqlitePool, owner: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query(
        r#"
        SELECT id, owner, filename, location, raw_text, normalized_text, summary, insights_json, created_at
        FROM documents
        WHERE owner = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_document).collect())
}

/// A single document by id, or `None` when no such document exists.
pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Document>> {
    let row = sqlx::query(
        r#"
        SELECT id, owner, filename, location, raw_text, normalized_text, summary, insights_json, created_at
        FROM documents
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_document))
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
    let insights_json: String = row.get("insights_json");
    let insights: Insights = serde_json::from_str(&insights_json).unwrap_or_default();

    Document {
        id: row.get("id"),
        owner: row.get("owner"),
        filename: row.get("filename"),
        location: row.get("location"),
        raw_text: row.get("raw_text"),
        normalized_text: row.get("normalized_text"),
        summary: row.get("summary"),
        insights,
        created_at: row.get("created_at"),
    }
}
