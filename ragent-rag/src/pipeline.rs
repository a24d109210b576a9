//! Ingestion and retrieval pipelines.
//!
//! The [`RagPipeline`] coordinates the ingest workflow (load → chunk → embed →
//! derive ids → upsert) and the query workflow (embed → search → aggregate) by
//! composing a [`DocumentLoader`], a [`Chunker`], an [`Embedder`] and a
//! [`Collection`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragent_rag::{RagPipeline, RagConfig, Collection, Embedder, FixedSizeChunker, PdfLoader};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(config)
//!     .loader(Arc::new(PdfLoader::new()))
//!     .chunker(Arc::new(FixedSizeChunker::new(1000, 200)))
//!     .embedder(embedder)
//!     .collection(collection)
//!     .build()?;
//!
//! let report = pipeline.ingest("manual.pdf", Some("manual")).await?;
//! let answer_context = pipeline.query("How do I reset it?", 5).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::chunking::Chunker;
use crate::collection::Collection;
use crate::config::RagConfig;
use crate::document::{Document, IngestReport, Payload, SearchResult, TextChunk, point_id};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::loader::DocumentLoader;

/// The ingestion and retrieval pipeline.
///
/// Holds no mutable state: concurrent `ingest` and `query` calls share only
/// the underlying vector store. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    loader: Arc<dyn DocumentLoader>,
    chunker: Arc<dyn Chunker>,
    embedder: Embedder,
    collection: Collection,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Return a reference to the target collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Ingest one PDF: load → chunk → embed → upsert.
    ///
    /// `source_id` defaults to the path. Re-ingesting with the same
    /// `source_id` replaces the earlier points instead of adding new ones.
    ///
    /// # Errors
    ///
    /// Fails fast on the first stage error; nothing is written unless every
    /// chunk was embedded and validated.
    pub async fn ingest(
        &self,
        pdf_path: impl AsRef<Path>,
        source_id: Option<&str>,
    ) -> Result<IngestReport> {
        let document = Document::new(pdf_path, source_id);
        let text = self.loader.load(&document.path).await.map_err(|e| {
            error!(source_id = %document.source_id, error = %e, "document load failed");
            e
        })?;
        self.ingest_text(&document.source_id, &text).await
    }

    /// Ingest already-extracted text under `source_id`: chunk → embed → upsert.
    pub async fn ingest_text(&self, source_id: &str, text: &str) -> Result<IngestReport> {
        // 1. Chunk the text
        let chunks = self.chunker.chunk(source_id, text).map_err(|e| {
            error!(source_id, text_len = text.len(), error = %e, "chunking failed");
            e
        })?;

        // 2. Embed every chunk in document mode
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts).await.map_err(|e| {
            error!(
                source_id,
                chunk_count = chunks.len(),
                error = %e,
                "embedding failed during ingestion"
            );
            e
        })?;

        // 3. Derive ids and payloads
        let (ids, payloads) = records_for(source_id, chunks);

        // 4. Upsert into the collection
        let ingested = ids.len();
        self.collection.upsert(vectors, ids, payloads).await.map_err(|e| {
            error!(
                source_id,
                chunk_count = ingested,
                error = %e,
                "upsert failed during ingestion"
            );
            e
        })?;

        info!(
            source_id,
            chunk_count = ingested,
            collection = self.collection.name(),
            "ingested document"
        );
        Ok(IngestReport { ingested })
    }

    /// Answer-side retrieval: embed the question and return the `top_k`
    /// closest chunks with their sources.
    ///
    /// A store without matches yields an empty [`SearchResult`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] before any embedding or index call if
    /// `top_k` is outside `1..=max_top_k`.
    pub async fn query(&self, question: &str, top_k: usize) -> Result<SearchResult> {
        let top_k = self.config.resolve_top_k(Some(top_k)).map_err(|e| {
            error!(top_k, max_top_k = self.config.max_top_k, "top_k out of range");
            e
        })?;

        // 1. Embed the question in query mode
        let query_vector = self.embedder.embed_query(question).await.map_err(|e| {
            error!(question_len = question.len(), error = %e, "query embedding failed");
            e
        })?;

        // 2. Search and aggregate
        let result = self.collection.search(&query_vector, top_k).await?;

        info!(
            top_k,
            contexts = result.contexts.len(),
            sources = result.sources.len(),
            "query completed"
        );
        Ok(result)
    }

    /// [`RagPipeline::query`] with the configured `default_top_k`.
    pub async fn query_default(&self, question: &str) -> Result<SearchResult> {
        self.query(question, self.config.default_top_k).await
    }
}

/// Point ids and payloads for the chunks of one source, in chunk order.
fn records_for(source_id: &str, chunks: Vec<TextChunk>) -> (Vec<Uuid>, Vec<Payload>) {
    chunks
        .into_iter()
        .map(|chunk| {
            let id = point_id(source_id, chunk.index);
            (id, Payload { source: source_id.to_string(), text: chunk.text })
        })
        .unzip()
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    loader: Option<Arc<dyn DocumentLoader>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Embedder>,
    collection: Option<Collection>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    ///
    /// The pipeline reads `default_top_k`, `max_top_k` and
    /// `embedding_dimensions` from it.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document loader.
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the text chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedder.
    pub fn embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the target collection.
    pub fn collection(mut self, collection: Collection) -> Self {
        self.collection = Some(collection);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing, or
    /// [`RagError::DimensionMismatch`] if the config, embedder and collection
    /// disagree on the vector dimension.
    ///
    /// The chunker is used as given; `chunk_size` and `chunk_overlap` in the
    /// config only matter to whoever constructs it.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.ok_or_else(|| RagError::Config("config is required".into()))?;
        let loader = self.loader.ok_or_else(|| RagError::Config("loader is required".into()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".into()))?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".into()))?;
        let collection =
            self.collection.ok_or_else(|| RagError::Config("collection is required".into()))?;

        if embedder.dimensions() != collection.dimensions() {
            return Err(RagError::DimensionMismatch {
                context: format!("embedder vs collection '{}'", collection.name()),
                expected: collection.dimensions(),
                actual: embedder.dimensions(),
            });
        }
        if config.embedding_dimensions != collection.dimensions() {
            return Err(RagError::DimensionMismatch {
                context: format!("config vs collection '{}'", collection.name()),
                expected: collection.dimensions(),
                actual: config.embedding_dimensions,
            });
        }

        Ok(RagPipeline { config, loader, chunker, embedder, collection })
    }
}
