//! # ragent-rag
//!
//! PDF ingestion and retrieval for retrieval-augmented generation.
//!
//! Documents are chunked into overlapping character windows, embedded in
//! document mode, and upserted into a cosine-similarity collection under ids
//! derived from `(source_id, chunk_index)`. Re-ingesting a source therefore
//! replaces its points. Questions are embedded in query mode and answered
//! with the `top_k` closest chunks plus their deduplicated sources.
//!
//! ## Features
//!
//! - `gemini` — [`GeminiEmbeddingProvider`] over the Gemini REST API
//! - `qdrant` — [`QdrantVectorStore`] over `qdrant-client`
//! - `pdf` — [`PdfLoader`] over `pdf-extract`
//! - `full` — all of the above
//!
//! Without features the crate still offers the [`InMemoryVectorStore`] and
//! every trait needed to plug in other backends.

pub mod chunking;
pub mod collection;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod vectorstore;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{Chunker, FixedSizeChunker, SentenceChunker};
pub use collection::Collection;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    CollectionInfo, Document, IngestReport, Payload, ScoredPoint, SearchResult, TextChunk,
    VectorRecord, point_id,
};
pub use embedding::{Embedder, EmbeddingProvider, TaskType};
pub use error::{ErrorKind, RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::DocumentLoader;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use vectorstore::VectorStore;

#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbeddingProvider;
#[cfg(feature = "pdf")]
pub use loader::PdfLoader;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
