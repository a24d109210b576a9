//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{CollectionInfo, ScoredPoint, VectorRecord};
use crate::error::Result;

/// A storage backend for vector embeddings with cosine similarity search.
///
/// Backends do the raw I/O only. Argument validation (lengths, dimensions,
/// `top_k`) lives in [`Collection`](crate::collection::Collection), which is
/// the API the pipelines use.
///
/// # Example
///
/// ```rust,ignore
/// use ragent_rag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 768).await?;
/// store.upsert("docs", &records).await?;
/// let hits = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name used in logs and errors.
    fn backend(&self) -> &str;

    /// Whether a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a named collection with cosine distance.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data. No-op if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Report point count, dimension and status of a collection.
    async fn collection_info(&self, name: &str) -> Result<CollectionInfo>;

    /// Insert or replace records by id.
    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<()>;

    /// Return at most `top_k` points ordered by descending cosine similarity.
    ///
    /// Ordering among equal scores is backend-defined and not stable across runs.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>>;
}
