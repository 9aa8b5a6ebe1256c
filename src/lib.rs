//! # Docsight
//!
//! A document-to-insight ingestion pipeline: user-uploaded documents
//! (plain text, PDF, Word) are reduced to raw text, analyzed, and stored
//! with a normalized token stream, an extractive summary, and a list of
//! named entities.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────────┐   ┌───────────┐
//! │  Uploads  │──▶│       Pipeline       │──▶│  SQLite   │
//! │ txt/pdf/  │   │ Extract → Normalize  │   │ documents │
//! │  doc(x)   │   │ → {Entities,Summary} │   └─────┬─────┘
//! └───────────┘   └──────────┬───────────┘         │
//!                            │                     │
//!                  ┌─────────┴──────┐       ┌──────┴──────┐
//!                  │    Analyzer    │       │ CLI / HTTP  │
//!                  │ builtin/remote │       │  surfaces   │
//!                  └────────────────┘       └─────────────┘
//! ```
//!
//! The linguistic-analysis capability is an injected dependency: it is
//! constructed once at process startup, shared read-only across
//! concurrent pipeline runs, and never reloaded per request.
//!
//! ## Quick Start
//!
//! ```bash
//! docsight init                          # create database
//! docsight ingest report.pdf --owner erin
//! docsight list --owner erin
//! docsight get <id>
//! docsight metrics --days 7
//! docsight serve                         # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Format-agnostic text extraction |
//! | [`analyzer`] | Linguistic-analysis capability (builtin/remote) |
//! | [`pipeline`] | Normalizer, entity extractor, summarizer, orchestrator |
//! | [`store`] | Document persistence |
//! | [`metrics`] | Aggregate reporting |
//! | [`server`] | JSON HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analyzer;
pub mod config;
pub mod db;
pub mod extract;
pub mod get;
pub mod ingest;
pub mod metrics;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod store;
