//! A validated handle on one named collection.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::document::{CollectionInfo, Payload, SearchResult, VectorRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// One collection of a [`VectorStore`], bound to its name and vector dimension.
///
/// All argument validation happens here, before the backend is touched, so a
/// rejected upsert never writes a partial batch.
///
/// # Example
///
/// ```rust,ignore
/// use ragent_rag::{Collection, InMemoryVectorStore};
///
/// let docs = Collection::open(Arc::new(InMemoryVectorStore::new()), "docs", 768).await?;
/// docs.upsert(vectors, ids, payloads).await?;
/// let result = docs.search(&query, 5).await?;
/// ```
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn VectorStore>,
    name: String,
    dimensions: usize,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("backend", &self.store.backend())
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl Collection {
    /// Open `name`, creating it with `dimensions` and cosine distance if absent.
    ///
    /// Existence is checked before creation; two processes racing to create
    /// the same collection may still collide, which surfaces as a backend error.
    ///
    /// # Errors
    ///
    /// - [`RagError::DimensionMismatch`] if the collection exists with another dimension
    /// - any backend error, unchanged
    pub async fn open(
        store: Arc<dyn VectorStore>,
        name: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let collection = Self { store, name: name.into(), dimensions };
        collection.ensure_created().await?;
        Ok(collection)
    }

    /// Create the collection if it is absent, otherwise verify its dimension.
    pub async fn ensure_created(&self) -> Result<()> {
        let name = self.name.as_str();
        let exists = self.store.collection_exists(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to check collection existence");
            e
        })?;
        if !exists {
            info!(collection = name, dimensions = self.dimensions, "creating collection");
            return self.store.create_collection(name, self.dimensions).await.map_err(|e| {
                error!(
                    collection = name,
                    dimensions = self.dimensions,
                    error = %e,
                    "failed to create collection"
                );
                e
            });
        }

        let existing = self.store.collection_info(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to read collection info");
            e
        })?;
        if existing.dimensions != self.dimensions {
            error!(
                collection = name,
                expected = self.dimensions,
                actual = existing.dimensions,
                "existing collection has a different dimension"
            );
            return Err(RagError::DimensionMismatch {
                context: format!("collection '{name}'"),
                expected: self.dimensions,
                actual: existing.dimensions,
            });
        }
        info!(collection = name, points = existing.points_count, "using existing collection");
        Ok(())
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The vector dimension of this collection.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Insert or replace points by id.
    ///
    /// # Errors
    ///
    /// Nothing is written if any of these fail:
    /// - [`RagError::InvalidInput`] if the sequences are empty
    /// - [`RagError::LengthMismatch`] if the three sequences differ in length
    /// - [`RagError::DimensionMismatch`] if any vector has the wrong dimension
    pub async fn upsert(
        &self,
        vectors: Vec<Vec<f32>>,
        ids: Vec<Uuid>,
        payloads: Vec<Payload>,
    ) -> Result<()> {
        if vectors.is_empty() && ids.is_empty() && payloads.is_empty() {
            return Err(RagError::InvalidInput(
                "vectors, ids, and payloads cannot be empty".into(),
            ));
        }
        if vectors.len() != ids.len() || vectors.len() != payloads.len() {
            error!(
                collection = %self.name,
                vectors = vectors.len(),
                ids = ids.len(),
                payloads = payloads.len(),
                "upsert length mismatch"
            );
            return Err(RagError::LengthMismatch {
                vectors: vectors.len(),
                ids: ids.len(),
                payloads: payloads.len(),
            });
        }
        for (i, vector) in vectors.iter().enumerate() {
            self.check_dimensions(vector, || format!("vector {i} (id {})", ids[i]))?;
        }

        let records: Vec<VectorRecord> = vectors
            .into_iter()
            .zip(ids)
            .zip(payloads)
            .map(|((vector, id), payload)| VectorRecord { id, vector, payload })
            .collect();

        info!(collection = %self.name, count = records.len(), "upserting points");
        self.store.upsert(&self.name, &records).await.map_err(|e| {
            error!(collection = %self.name, count = records.len(), error = %e, "upsert failed");
            e
        })
    }

    /// Return the `top_k` closest chunks as contexts and sources.
    ///
    /// An empty collection yields an empty [`SearchResult`], not an error.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if `top_k == 0` or the query vector is empty
    /// - [`RagError::DimensionMismatch`] if the query vector has the wrong dimension
    pub async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<SearchResult> {
        if top_k == 0 {
            return Err(RagError::InvalidInput("top_k must be at least 1".into()));
        }
        if query_vector.is_empty() {
            return Err(RagError::InvalidInput("query_vector cannot be empty".into()));
        }
        self.check_dimensions(query_vector, || "query vector".to_string())?;

        debug!(collection = %self.name, top_k, "searching collection");
        let hits = self.store.search(&self.name, query_vector, top_k).await.map_err(|e| {
            error!(collection = %self.name, top_k, error = %e, "search failed");
            e
        })?;

        let result = SearchResult::from_points(hits.into_iter().take(top_k));
        info!(
            collection = %self.name,
            contexts = result.contexts.len(),
            sources = result.sources.len(),
            "search completed"
        );
        Ok(result)
    }

    /// Delete the collection and all its points. No-op if it does not exist.
    pub async fn delete(&self) -> Result<()> {
        self.store.delete_collection(&self.name).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "failed to delete collection");
            e
        })?;
        info!(collection = %self.name, "deleted collection");
        Ok(())
    }

    /// Report the backend's view of this collection.
    pub async fn info(&self) -> Result<CollectionInfo> {
        self.store.collection_info(&self.name).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "failed to read collection info");
            e
        })
    }

    fn check_dimensions(&self, vector: &[f32], context: impl FnOnce() -> String) -> Result<()> {
        if vector.len() == self.dimensions {
            return Ok(());
        }
        let context = context();
        error!(
            collection = %self.name,
            %context,
            expected = self.dimensions,
            actual = vector.len(),
            "vector dimension mismatch"
        );
        Err(RagError::DimensionMismatch {
            context,
            expected: self.dimensions,
            actual: vector.len(),
        })
    }
}
