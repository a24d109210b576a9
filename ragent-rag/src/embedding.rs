//! Embedding provider trait and the validating [`Embedder`] wrapper.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{RagError, Result};

/// The retrieval role a text is embedded for.
///
/// Document and query embeddings of the same text are not interchangeable;
/// they are only compared through the store's distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// A chunk destined for the index.
    RetrievalDocument,
    /// A question searched against the index.
    RetrievalQuery,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetrievalDocument => f.write_str("RETRIEVAL_DOCUMENT"),
            Self::RetrievalQuery => f.write_str("RETRIEVAL_QUERY"),
        }
    }
}

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// Providers do not validate their output. [`Embedder`] does.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str], task: TaskType) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, task).await?);
        }
        Ok(results)
    }

    /// Name used in logs and errors.
    fn name(&self) -> &str;
}

/// Validating front end over an [`EmbeddingProvider`].
///
/// Rejects blank input before any provider call, truncates over-long texts,
/// and checks that every returned vector has the configured dimension. A
/// failure anywhere in a batch fails the whole batch.
///
/// # Example
///
/// ```rust,ignore
/// use ragent_rag::Embedder;
///
/// let embedder = Embedder::new(Arc::new(provider), 768);
/// let vectors = embedder.embed_documents(&chunks).await?;
/// let query = embedder.embed_query("what is covered?").await?;
/// ```
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    max_input_chars: usize,
    batch_size: usize,
}

impl fmt::Debug for Embedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedder")
            .field("provider", &self.provider.name())
            .field("dimensions", &self.dimensions)
            .field("max_input_chars", &self.max_input_chars)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Embedder {
    /// Default per-text truncation limit in characters.
    pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;

    /// Default number of texts per provider request.
    pub const DEFAULT_BATCH_SIZE: usize = 100;

    /// Wrap `provider`, expecting vectors of `dimensions` elements.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, dimensions: usize) -> Self {
        Self {
            provider,
            dimensions,
            max_input_chars: Self::DEFAULT_MAX_INPUT_CHARS,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the per-text truncation limit in characters.
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max.max(1);
        self
    }

    /// Set the number of texts sent per provider request.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The dimension every returned vector is checked against.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed document chunks in document mode, preserving order.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyInput`] if `texts` is empty or any text is blank
    /// - [`RagError::EmbeddingCountMismatch`] if the provider returns a different number of vectors
    /// - [`RagError::DimensionMismatch`] if any vector has the wrong length
    /// - any provider error, unchanged
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(RagError::EmptyInput("no texts to embed".into()));
        }
        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            error!(provider = self.provider.name(), index = i, "blank text in embedding batch");
            return Err(RagError::EmptyInput(format!("text at index {i} is blank")));
        }

        let prepared: Vec<&str> =
            texts.iter().enumerate().map(|(i, t)| self.truncate(t, i)).collect();

        let mut vectors = Vec::with_capacity(prepared.len());
        for (batch_no, batch) in prepared.chunks(self.batch_size).enumerate() {
            debug!(
                provider = self.provider.name(),
                batch = batch_no,
                batch_size = batch.len(),
                "embedding document batch"
            );
            let embedded = self.provider.embed_batch(batch, TaskType::RetrievalDocument).await?;
            if embedded.len() != batch.len() {
                error!(
                    provider = self.provider.name(),
                    sent = batch.len(),
                    received = embedded.len(),
                    "provider returned wrong number of embeddings"
                );
                return Err(RagError::EmbeddingCountMismatch {
                    provider: self.provider.name().to_string(),
                    sent: batch.len(),
                    received: embedded.len(),
                });
            }
            vectors.extend(embedded);
        }

        for (i, vector) in vectors.iter().enumerate() {
            self.check_dimensions(vector, &format!("document embedding {i}"))?;
        }
        Ok(vectors)
    }

    /// Embed a single question in query mode.
    ///
    /// # Errors
    ///
    /// Same as [`Embedder::embed_documents`], for a single text.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RagError::EmptyInput("query text is blank".into()));
        }
        let text = self.truncate(text, 0);
        debug!(provider = self.provider.name(), text_len = text.len(), "embedding query");

        let vector = self.provider.embed(text, TaskType::RetrievalQuery).await?;
        self.check_dimensions(&vector, "query embedding")?;
        Ok(vector)
    }

    /// Cut `text` to `max_input_chars` characters, on a character boundary.
    fn truncate<'a>(&self, text: &'a str, index: usize) -> &'a str {
        match text.char_indices().nth(self.max_input_chars) {
            Some((cut, _)) => {
                warn!(
                    provider = self.provider.name(),
                    index,
                    max_chars = self.max_input_chars,
                    original_bytes = text.len(),
                    "truncating over-long text before embedding"
                );
                &text[..cut]
            }
            None => text,
        }
    }

    fn check_dimensions(&self, vector: &[f32], context: &str) -> Result<()> {
        if vector.len() != self.dimensions {
            error!(
                provider = self.provider.name(),
                context,
                expected = self.dimensions,
                actual = vector.len(),
                "embedding dimension mismatch"
            );
            return Err(RagError::DimensionMismatch {
                context: context.to_string(),
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
