//! Aggregate reporting over stored documents.
//!
//! Provides the numbers behind the reporting surface: upload counts per
//! day over a trailing window and entity-label frequency across every
//! stored document. Used by `docsight metrics` and `GET /metrics`.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Upload count for one calendar day (UTC).
#[derive(Debug, Clone, Serialize)]
pub struct DayCount {
    pub day: String,
    pub count: i64,
}

/// Occurrence count for one entity label.
#[derive(Debug, Clone, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Oldest day first, zero-filled for days without uploads.
    pub uploads: Vec<DayCount>,
    /// Sorted by count descending, then label.
    pub entities: Vec<LabelCount>,
}

/// Collect upload counts for the last `days` days plus entity-label
/// frequency over all stored insights.
pub async fn collect_metrics(pool: &SqlitePool, days: u32) -> Result<MetricsReport> {
    let today = Utc::now().date_naive();

    let mut uploads = Vec::with_capacity(days as usize);
    for i in (0..days as i64).rev() {
        let day = today - Duration::days(i);
        let start = day.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end = (day + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE created_at >= ? AND created_at < ?",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        uploads.push(DayCount {
            day: day.format("%Y-%m-%d").to_string(),
            count,
        });
    }

    let rows: Vec<String> = sqlx::query_scalar("SELECT insights_json FROM documents")
        .fetch_all(pool)
        .await?;

    let mut counter: HashMap<String, i64> = HashMap::new();
    for json in &rows {
        let value: serde_json::Value = serde_json::from_str(json).unwrap_or_default();
        if let Some(entities) = value.get("entities").and_then(|e| e.as_array()) {
            for ent in entities {
                *counter.entry(label_of(ent)).or_insert(0) += 1;
            }
        }
    }

    let mut entities: Vec<LabelCount> = counter
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    entities.sort_by(|a, b| b.count.cmp(&a.count).then(a.label.cmp(&b.label)));

    Ok(MetricsReport { uploads, entities })
}

/// Label of one stored entity value, read leniently.
///
/// Policy: rows written by this crate are `{text, label}` objects; rows
/// written as `[text, label]` pairs by other tooling are accepted too.
/// Anything without a readable label is counted as `"UNKNOWN"` rather
/// than dropped or rejected.
fn label_of(ent: &serde_json::Value) -> String {
    if let Some(label) = ent.get("label").and_then(|l| l.as_str()) {
        return label.to_string();
    }
    if let Some(pair) = ent.as_array() {
        if let Some(label) = pair.get(1).and_then(|l| l.as_str()) {
            return label.to_string();
        }
    }
    "UNKNOWN".to_string()
}

/// Run the metrics command: query the database and print a summary.
pub async fn run_metrics(config: &Config, days: u32) -> Result<()> {
    let pool = db::connect(config).await?;
    let report = collect_metrics(&pool, days).await?;
    pool.close().await;

    println!("Docsight — Upload Metrics (last {} days)", days);
    println!("========================================");
    println!();
    println!("  {:<12} {:>8}", "DAY", "UPLOADS");
    for dc in &report.uploads {
        println!("  {:<12} {:>8}", dc.day, dc.count);
    }

    println!();
    if report.entities.is_empty() {
        println!("  No entities recorded yet.");
    } else {
        println!("  {:<16} {:>8}", "ENTITY LABEL", "COUNT");
        for lc in &report.entities {
            println!("  {:<16} {:>8}", lc.label, lc.count);
        }
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_and_pair_shapes_yield_their_label() {
        let obj = serde_json::json!({"text": "Acme Corp", "label": "ORG"});
        assert_eq!(label_of(&obj), "ORG");

        let pair = serde_json::json!(["Acme Corp", "ORG"]);
        assert_eq!(label_of(&pair), "ORG");
    }

    #[test]
    fn malformed_entities_bucket_as_unknown() {
        for ent in [
            serde_json::json!(["only text"]),
            serde_json::json!([]),
            serde_json::json!({"text": "no label"}),
            serde_json::json!("bare string"),
            serde_json::json!(42),
        ] {
            assert_eq!(label_of(&ent), "UNKNOWN");
        }
    }
}
