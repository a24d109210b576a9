//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragent_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::connect("http://localhost:6334", Duration::from_secs(60), None).await?;
//! store.create_collection("docs", 768).await?;
//! store.upsert("docs", &records).await?;
//! let hits = store.search("docs", &query_embedding, 5).await?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CollectionStatus, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload as QdrantPayload, Qdrant};
use tracing::{debug, error, info};

use crate::document::{CollectionInfo, Payload, ScoredPoint, VectorRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "qdrant";

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Wraps a [`qdrant_client::Qdrant`] client and maps collections to Qdrant
/// collections with cosine distance. The `{source, text}` payload is stored
/// as Qdrant payload fields of the same names.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to Qdrant at `url` and verify the server answers.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Connection`] if the client can not be built or the
    /// health check fails. The call is not retried.
    pub async fn connect(url: &str, timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let connection_err = |message: String| {
            error!(backend = BACKEND, url, %message, "failed to connect to qdrant");
            RagError::Connection { backend: BACKEND.to_string(), url: url.to_string(), message }
        };

        let client = Qdrant::from_url(url)
            .timeout(timeout)
            .api_key(api_key)
            .build()
            .map_err(|e| connection_err(e.to_string()))?;

        client.health_check().await.map_err(|e| connection_err(e.to_string()))?;
        info!(backend = BACKEND, url, "connected to qdrant");

        Ok(Self { client })
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStore { backend: BACKEND.to_string(), message: e.to_string() }
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn to_payload(fields: &HashMap<String, QdrantValue>) -> Payload {
        let field =
            |name: &str| fields.get(name).and_then(Self::extract_string).unwrap_or_default();
        Payload { source: field("source"), text: field("text") }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client.collection_exists(name).await.map_err(Self::map_err)
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.collection_exists(name).await? {
            debug!(collection = name, "qdrant collection absent, nothing to delete");
            return Ok(());
        }
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let response = self.client.collection_info(name).await.map_err(Self::map_err)?;
        let info = response.result.ok_or_else(|| RagError::VectorStore {
            backend: BACKEND.to_string(),
            message: format!("no info returned for collection '{name}'"),
        })?;

        let dimensions = info
            .config
            .as_ref()
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|v| v.config.as_ref())
            .and_then(|c| match c {
                VectorsConfigKind::Params(params) => Some(params.size as usize),
                VectorsConfigKind::ParamsMap(_) => None,
            })
            .ok_or_else(|| RagError::VectorStore {
                backend: BACKEND.to_string(),
                message: format!("collection '{name}' does not use a single unnamed vector"),
            })?;

        let status = CollectionStatus::try_from(info.status)
            .map(|s| s.as_str_name().to_lowercase())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(CollectionInfo {
            name: name.to_string(),
            points_count: info.points_count.unwrap_or_default(),
            dimensions,
            status,
        })
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points = records
            .iter()
            .map(|record| {
                let payload = QdrantPayload::try_from(serde_json::json!({
                    "source": record.payload.source,
                    "text": record.payload.text,
                }))
                .map_err(Self::map_err)?;
                Ok(PointStruct::new(record.id.to_string(), record.vector.clone(), payload))
            })
            .collect::<Result<Vec<PointStruct>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = records.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let id = scored
                    .id
                    .as_ref()
                    .and_then(|pid| match &pid.point_id_options {
                        Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
                        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
                        None => None,
                    })
                    .unwrap_or_default();

                ScoredPoint { id, score: scored.score, payload: Self::to_payload(&scored.payload) }
            })
            .collect();

        Ok(results)
    }
}
