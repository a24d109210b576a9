//! # RAGent CLI (`ragent`)
//!
//! Thin launcher over `ragent-rag`: ingest PDFs into a Qdrant collection and
//! retrieve context for questions. Every command prints one JSON object on
//! stdout; logs go to stderr and are filtered with `RUST_LOG`.
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! export RAGENT_EMBEDDING_DIMENSIONS=768
//!
//! ragent ingest ./manual.pdf --source-id manual
//! ragent query "How do I reset the device?" --top-k 5
//! ragent info
//! ragent reset
//! ```

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

const DEFAULT_LOG_FILTER: &str = "warn,ragent_rag=info,ragent_cli=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.overrides.resolve(|key| std::env::var(key).ok())?;
    tracing::debug!(
        collection = %config.collection,
        qdrant_url = %config.qdrant_url,
        dimensions = config.embedding_dimensions,
        "resolved configuration"
    );

    let output = commands::run(cli.command, config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
