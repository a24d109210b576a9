//! Command-line arguments.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ragent_rag::{RagConfig, Result};

/// RAGent: ingest PDFs into a vector index and retrieve context for questions.
///
/// Configuration comes from `RAGENT_*` environment variables; the flags below
/// override them. `GEMINI_API_KEY` must be set for `ingest` and `query`.
#[derive(Debug, Parser)]
#[command(name = "ragent", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract, chunk, embed and upsert one PDF.
    ///
    /// Re-ingesting a file under the same source id replaces its chunks.
    Ingest {
        /// Path to the PDF.
        pdf: PathBuf,

        /// Identifier stored with every chunk. Defaults to the path.
        #[arg(long)]
        source_id: Option<String>,
    },

    /// Retrieve the chunks closest to a question.
    Query {
        /// The natural-language question.
        question: String,

        /// Number of chunks to return. Defaults to `RAGENT_DEFAULT_TOP_K`.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show the collection's point count, dimension and status.
    Info,

    /// Delete the collection and every point in it.
    Reset,
}

impl Command {
    /// Check arguments that the configuration bounds, before any backend is
    /// contacted.
    pub fn validate(&self, config: &RagConfig) -> Result<()> {
        if let Command::Query { top_k, .. } = self {
            config.resolve_top_k(*top_k)?;
        }
        Ok(())
    }
}

/// Flags that take precedence over the matching `RAGENT_*` variable.
#[derive(Debug, Default, Args)]
pub struct ConfigOverrides {
    /// Collection name [env: RAGENT_COLLECTION]
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Qdrant gRPC endpoint [env: RAGENT_QDRANT_URL]
    #[arg(long, global = true)]
    pub qdrant_url: Option<String>,

    /// Embedding model [env: RAGENT_EMBEDDING_MODEL]
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Embedding dimension [env: RAGENT_EMBEDDING_DIMENSIONS]
    #[arg(long, global = true)]
    pub dimensions: Option<usize>,

    /// Chunk size in characters [env: RAGENT_CHUNK_SIZE]
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Chunk overlap in characters [env: RAGENT_CHUNK_OVERLAP]
    #[arg(long, global = true)]
    pub chunk_overlap: Option<usize>,
}

impl ConfigOverrides {
    fn as_vars(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        let mut set = |key, value: Option<String>| {
            if let Some(value) = value {
                vars.insert(key, value);
            }
        };
        set("RAGENT_COLLECTION", self.collection.clone());
        set("RAGENT_QDRANT_URL", self.qdrant_url.clone());
        set("RAGENT_EMBEDDING_MODEL", self.model.clone());
        set("RAGENT_EMBEDDING_DIMENSIONS", self.dimensions.map(|d| d.to_string()));
        set("RAGENT_CHUNK_SIZE", self.chunk_size.map(|s| s.to_string()));
        set("RAGENT_CHUNK_OVERLAP", self.chunk_overlap.map(|o| o.to_string()));
        vars
    }

    /// Resolve the configuration: flags first, then `env`.
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Result<RagConfig> {
        let vars = self.as_vars();
        RagConfig::from_lookup(|key| vars.get(key).cloned().or_else(|| env(key)))
    }
}
