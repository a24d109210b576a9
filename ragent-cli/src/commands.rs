//! Wiring of configuration, backends and the pipeline for each command.

use std::sync::Arc;

use anyhow::Context;
use ragent_rag::{
    Collection, Embedder, FixedSizeChunker, GeminiEmbeddingProvider, PdfLoader, QdrantVectorStore,
    RagConfig, RagPipeline, VectorStore,
};
use serde_json::{Value, json};
use tracing::info;

use crate::cli::Command;

/// Run `command` and return the JSON object to print.
pub async fn run(command: Command, config: RagConfig) -> anyhow::Result<Value> {
    command.validate(&config)?;

    let store: Arc<dyn VectorStore> = Arc::new(
        QdrantVectorStore::connect(
            &config.qdrant_url,
            config.timeout(),
            config.qdrant_api_key.clone(),
        )
        .await?,
    );

    match command {
        Command::Ingest { pdf, source_id } => {
            let pipeline = pipeline(config, store).await?;
            let report = pipeline
                .ingest(&pdf, source_id.as_deref())
                .await
                .with_context(|| format!("failed to ingest {}", pdf.display()))?;
            Ok(serde_json::to_value(report)?)
        }
        Command::Query { question, top_k } => {
            let top_k = config.resolve_top_k(top_k)?;
            let pipeline = pipeline(config, store).await?;
            let result = pipeline.query(&question, top_k).await.context("query failed")?;
            Ok(serde_json::to_value(result)?)
        }
        Command::Info => collection_info(store.as_ref(), &config.collection).await,
        Command::Reset => {
            // Deleting goes straight to the store so a collection created with
            // another dimension can still be dropped.
            store.delete_collection(&config.collection).await?;
            info!(collection = %config.collection, "collection reset");
            Ok(json!({ "deleted": config.collection }))
        }
    }
}

/// Report a collection as stored, without creating it or checking its
/// dimension against the configuration.
async fn collection_info(store: &dyn VectorStore, name: &str) -> anyhow::Result<Value> {
    if !store.collection_exists(name).await? {
        anyhow::bail!("collection '{name}' does not exist; ingest a document first");
    }
    let info = store.collection_info(name).await?;
    Ok(serde_json::to_value(info)?)
}

async fn pipeline(config: RagConfig, store: Arc<dyn VectorStore>) -> anyhow::Result<RagPipeline> {
    let provider = GeminiEmbeddingProvider::from_env()?
        .with_model(config.embedding_model.clone())
        .with_output_dimensionality(config.embedding_dimensions);
    let embedder = Embedder::new(Arc::new(provider), config.embedding_dimensions)
        .with_max_input_chars(config.max_input_chars)
        .with_batch_size(config.embed_batch_size);

    let collection =
        Collection::open(store, config.collection.clone(), config.embedding_dimensions).await?;

    let pipeline = RagPipeline::builder()
        .chunker(Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)))
        .loader(Arc::new(PdfLoader::new()))
        .embedder(embedder)
        .collection(collection)
        .config(config)
        .build()?;
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use ragent_rag::InMemoryVectorStore;

    use super::*;

    #[tokio::test]
    async fn info_on_missing_collection_creates_nothing() {
        let store = InMemoryVectorStore::new();

        let err = collection_info(&store, "docs").await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!store.collection_exists("docs").await.unwrap());
    }

    #[tokio::test]
    async fn info_reports_the_stored_dimension() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs", 384).await.unwrap();

        let info = collection_info(&store, "docs").await.unwrap();
        assert_eq!(info["name"], "docs");
        assert_eq!(info["dimensions"], 384);
        assert_eq!(info["points_count"], 0);
    }
}
