//! Configuration for the ingestion and retrieval pipelines.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default Gemini embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Default Qdrant gRPC endpoint.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Configuration parameters for ingestion and retrieval.
///
/// There is no `Default`: the embedding dimension depends on the
/// deployed model and must be supplied through [`RagConfig::builder`] or
/// [`RagConfig::from_env`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Embedding model name.
    pub embedding_model: String,
    /// Dimension of every vector produced by the embedder and stored in the collection.
    pub embedding_dimensions: usize,
    /// Texts longer than this many characters are truncated before embedding.
    pub max_input_chars: usize,
    /// Maximum number of texts per embedding request.
    pub embed_batch_size: usize,
    /// Vector store endpoint.
    pub qdrant_url: String,
    /// Optional API key for the vector store.
    #[serde(default, skip_serializing)]
    pub qdrant_api_key: Option<String>,
    /// Collection holding the document vectors.
    pub collection: String,
    /// Request timeout for vector store calls, in seconds.
    pub timeout_secs: u64,
    /// `top_k` used when the caller does not pass one.
    pub default_top_k: usize,
    /// Largest `top_k` a query may request.
    pub max_top_k: usize,
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build a configuration from `RAGENT_*` environment variables.
    ///
    /// `RAGENT_EMBEDDING_DIMENSIONS` is required; every other variable falls
    /// back to the builder default.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a variable cannot be parsed or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RagConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(v) = parse_var(&lookup, "RAGENT_CHUNK_SIZE")? {
            builder = builder.chunk_size(v);
        }
        if let Some(v) = parse_var(&lookup, "RAGENT_CHUNK_OVERLAP")? {
            builder = builder.chunk_overlap(v);
        }
        if let Some(v) = lookup("RAGENT_EMBEDDING_MODEL") {
            builder = builder.embedding_model(v);
        }
        if let Some(v) = parse_var(&lookup, "RAGENT_EMBEDDING_DIMENSIONS")? {
            builder = builder.embedding_dimensions(v);
        }
        if let Some(v) = parse_var(&lookup, "RAGENT_MAX_INPUT_CHARS")? {
            builder = builder.max_input_chars(v);
        }
        if let Some(v) = parse_var(&lookup, "RAGENT_EMBED_BATCH_SIZE")? {
            builder = builder.embed_batch_size(v);
        }
        if let Some(v) = lookup("RAGENT_QDRANT_URL") {
            builder = builder.qdrant_url(v);
        }
        if let Some(v) = lookup("RAGENT_QDRANT_API_KEY") {
            builder = builder.qdrant_api_key(v);
        }
        if let Some(v) = lookup("RAGENT_COLLECTION") {
            builder = builder.collection(v);
        }
        if let Some(v) = parse_var(&lookup, "RAGENT_TIMEOUT_SECS")? {
            builder = builder.timeout_secs(v);
        }
        if let Some(v) = parse_var(&lookup, "RAGENT_DEFAULT_TOP_K")? {
            builder = builder.default_top_k(v);
        }
        if let Some(v) = parse_var(&lookup, "RAGENT_MAX_TOP_K")? {
            builder = builder.max_top_k(v);
        }
        builder.build()
    }

    /// Vector store request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve a requested `top_k`, falling back to `default_top_k`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if `top_k` is outside `1..=max_top_k`.
    pub fn resolve_top_k(&self, top_k: Option<usize>) -> Result<usize> {
        let top_k = top_k.unwrap_or(self.default_top_k);
        if top_k == 0 || top_k > self.max_top_k {
            return Err(RagError::InvalidInput(format!(
                "top_k must be within 1..={}, got {top_k}",
                self.max_top_k
            )));
        }
        Ok(top_k)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RagError::Config(format!("{key}={raw:?} is invalid: {e}"))),
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone)]
pub struct RagConfigBuilder {
    chunk_size: usize,
    chunk_overlap: usize,
    embedding_model: String,
    embedding_dimensions: Option<usize>,
    max_input_chars: usize,
    embed_batch_size: usize,
    qdrant_url: String,
    qdrant_api_key: Option<String>,
    collection: String,
    timeout_secs: u64,
    default_top_k: usize,
    max_top_k: usize,
}

impl Default for RagConfigBuilder {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: None,
            max_input_chars: 10_000,
            embed_batch_size: 100,
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            qdrant_api_key: None,
            collection: "docs".to_string(),
            timeout_secs: 60,
            default_top_k: 5,
            max_top_k: 20,
        }
    }
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap;
        self
    }

    /// Set the embedding model name.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set the embedding dimension shared by the embedder and the collection.
    pub fn embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.embedding_dimensions = Some(dimensions);
        self
    }

    /// Set the per-text truncation limit in characters.
    pub fn max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    /// Set the maximum number of texts per embedding request.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.embed_batch_size = size;
        self
    }

    /// Set the vector store endpoint.
    pub fn qdrant_url(mut self, url: impl Into<String>) -> Self {
        self.qdrant_url = url.into();
        self
    }

    /// Set the vector store API key.
    pub fn qdrant_api_key(mut self, key: impl Into<String>) -> Self {
        self.qdrant_api_key = Some(key.into());
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    /// Set the vector store request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the `top_k` used when a query does not specify one.
    pub fn default_top_k(mut self, k: usize) -> Self {
        self.default_top_k = k;
        self
    }

    /// Set the largest accepted `top_k`.
    pub fn max_top_k(mut self, k: usize) -> Self {
        self.max_top_k = k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `embedding_dimensions` was never set or is zero
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `max_input_chars == 0` or `embed_batch_size == 0`
    /// - `collection` is blank
    /// - `default_top_k` is outside `1..=max_top_k`
    pub fn build(self) -> Result<RagConfig> {
        let embedding_dimensions = match self.embedding_dimensions {
            Some(d) if d > 0 => d,
            Some(_) => {
                return Err(RagError::Config("embedding_dimensions must be positive".into()));
            }
            None => return Err(RagError::Config("embedding_dimensions is required".into())),
        };
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_input_chars == 0 {
            return Err(RagError::Config("max_input_chars must be greater than zero".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::Config("embed_batch_size must be greater than zero".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection name must not be empty".into()));
        }
        if self.default_top_k == 0 || self.default_top_k > self.max_top_k {
            return Err(RagError::Config(format!(
                "default_top_k ({}) must be within 1..={}",
                self.default_top_k, self.max_top_k
            )));
        }

        Ok(RagConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            embedding_model: self.embedding_model,
            embedding_dimensions,
            max_input_chars: self.max_input_chars,
            embed_batch_size: self.embed_batch_size,
            qdrant_url: self.qdrant_url,
            qdrant_api_key: self.qdrant_api_key,
            collection: self.collection,
            timeout_secs: self.timeout_secs,
            default_top_k: self.default_top_k,
            max_top_k: self.max_top_k,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn dimensions_are_required() {
        let err = RagConfig::builder().build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn defaults_match_pipeline_contract() {
        let config = RagConfig::builder().embedding_dimensions(768).build().unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.max_input_chars, 10_000);
        assert_eq!(config.max_top_k, 20);
        assert_eq!(config.collection, "docs");
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = RagConfig::builder()
            .embedding_dimensions(8)
            .chunk_size(100)
            .chunk_overlap(100)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn reads_environment_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RAGENT_EMBEDDING_DIMENSIONS", "3072"),
            ("RAGENT_COLLECTION", "papers"),
            ("RAGENT_CHUNK_SIZE", "500"),
            ("RAGENT_CHUNK_OVERLAP", "50"),
        ]);
        let config =
            RagConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.embedding_dimensions, 3072);
        assert_eq!(config.collection, "papers");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
    }

    #[test]
    fn top_k_is_resolved_within_bounds() {
        let config = RagConfig::builder().embedding_dimensions(8).build().unwrap();
        assert_eq!(config.resolve_top_k(None).unwrap(), 5);
        assert_eq!(config.resolve_top_k(Some(20)).unwrap(), 20);
        for top_k in [0, 21] {
            let err = config.resolve_top_k(Some(top_k)).unwrap_err();
            assert!(matches!(err, RagError::InvalidInput(_)));
        }
    }

    #[test]
    fn rejects_unparsable_environment_value() {
        let err = RagConfig::from_lookup(|key| {
            (key == "RAGENT_EMBEDDING_DIMENSIONS").then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("RAGENT_EMBEDDING_DIMENSIONS"));
    }
}
