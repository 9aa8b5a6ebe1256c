//! Core data models used throughout Docsight.
//!
//! These types represent the documents and derived insights that flow
//! through the ingestion pipeline and into the store.

use serde::{Deserialize, Serialize};

/// A recognized named-entity span paired with its semantic label.
///
/// Labels come from an open vocabulary (e.g. `PERSON`, `ORG`, `DATE`).
/// Entities keep the order in which their spans occur in the source text,
/// and duplicate spans are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// Derived signals for one document. Created once per ingested document,
/// never partially updated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub entities: Vec<Entity>,
}

/// Pipeline output before the store assigns an id and timestamp.
///
/// `raw_text` is immutable once produced; `normalized_text`, `summary`,
/// and `insights` are functions of it and are always computed together.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub owner: String,
    pub filename: String,
    pub location: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub summary: String,
    pub insights: Insights,
}

/// A fully persisted document as read back from SQLite.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub owner: String,
    pub filename: String,
    pub location: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub summary: String,
    pub insights: Insights,
    pub created_at: i64,
}
