//! # Docsight CLI
//!
//! The `docsight` binary is the primary interface for the document
//! ingestion pipeline. It provides commands for database initialization,
//! document ingestion, retrieval, reporting, and serving the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! docsight --config ./config/docsight.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsight init` | Create the SQLite database and run schema migrations |
//! | `docsight ingest <file> --owner <id>` | Extract, analyze, and persist one document |
//! | `docsight list --owner <id>` | List an owner's documents, newest first |
//! | `docsight get <id>` | Print a full document record |
//! | `docsight metrics` | Upload counts and entity-label frequency |
//! | `docsight serve` | Start the JSON HTTP server |

mod analyzer;
mod config;
mod db;
mod extract;
mod get;
mod ingest;
mod metrics;
mod migrate;
mod models;
mod pipeline;
mod server;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Docsight — a document-to-insight ingestion pipeline.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docsight.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docsight",
    about = "Docsight — extract text from uploaded documents and derive summaries and entities",
    version,
    long_about = "Docsight ingests plain-text, PDF, and Word documents, reduces them to raw \
    text, and derives a normalized token stream, an extractive summary, and a labeled entity \
    list via a pluggable linguistic analyzer. Results are persisted to SQLite and exposed \
    through this CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docsight.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Ingest one document file.
    ///
    /// Copies the file into managed storage, extracts its text, runs the
    /// analysis pipeline, and persists the resulting record. Nothing is
    /// persisted if any stage fails.
    Ingest {
        /// Path to the document (.txt, .pdf, .docx, .doc).
        file: PathBuf,

        /// Opaque identity of the document's owner.
        #[arg(long)]
        owner: String,
    },

    /// List an owner's documents, newest first.
    List {
        /// Opaque identity of the document owner.
        #[arg(long)]
        owner: String,
    },

    /// Print a full document record by its id.
    Get {
        /// Document UUID.
        id: String,
    },

    /// Show upload counts and entity-label frequency.
    Metrics {
        /// Size of the trailing day window.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Start the JSON HTTP server.
    ///
    /// Exposes upload, retrieval, and metrics endpoints on the address
    /// configured in `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { file, owner } => {
            ingest::run_ingest(&cfg, &file, &owner).await?;
        }
        Commands::List { owner } => {
            get::run_list(&cfg, &owner).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Metrics { days } => {
            metrics::run_metrics(&cfg, days).await?;
        }
        Commands::Serve => {
            use tracing_subscriber::EnvFilter;
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .init();
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
