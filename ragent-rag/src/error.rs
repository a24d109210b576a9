//! Error types for the `ragent-rag` crate.

use thiserror::Error;

/// Broad classification of a [`RagError`].
///
/// Callers use this to decide who has to act on a failure: the caller
/// (bad input), the orchestration layer (retry an external call), or an
/// operator (embedder and store configuration have drifted apart).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, empty or out-of-range arguments. Not retryable.
    InputValidation,
    /// Embedding or index connectivity, or an unexpected response.
    ExternalService,
    /// Dimension or length mismatches. Always fatal.
    DataIntegrity,
}

/// Errors that can occur in ingestion and retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// An input text was empty or contained only whitespace.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// An argument was out of its accepted range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The document to ingest does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was requested.
        path: String,
    },

    /// The document is not a format the loader can read.
    #[error("Unsupported format ({path}): {reason}")]
    UnsupportedFormat {
        /// The path that was requested.
        path: String,
        /// Why the document was rejected.
        reason: String,
    },

    /// The document produced no extractable text.
    #[error("No content extracted from '{source_id}'")]
    NoContentExtracted {
        /// The source the empty text belongs to.
        source_id: String,
    },

    /// A vector did not have the configured dimension.
    #[error("Dimension mismatch ({context}): expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which vector or operation was being validated.
        context: String,
        /// The configured dimension.
        expected: usize,
        /// The dimension that was observed.
        actual: usize,
    },

    /// Parallel sequences that must line up had different lengths.
    #[error("Length mismatch: vectors({vectors}), ids({ids}), payloads({payloads})")]
    LengthMismatch {
        /// Number of vectors.
        vectors: usize,
        /// Number of ids.
        ids: usize,
        /// Number of payloads.
        payloads: usize,
    },

    /// An embedding provider returned a different number of vectors than texts.
    #[error(
        "Embedding count mismatch ({provider}): sent {sent} texts, received {received} vectors"
    )]
    EmbeddingCountMismatch {
        /// The embedding provider that answered.
        provider: String,
        /// Number of texts in the request.
        sent: usize,
        /// Number of vectors in the response.
        received: usize,
    },

    /// The vector store could not be reached at construction time.
    #[error("Cannot connect to {backend} at {url}: {message}")]
    Connection {
        /// The vector store backend.
        backend: String,
        /// The endpoint that was tried.
        url: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput(_)
            | Self::InvalidInput(_)
            | Self::FileNotFound { .. }
            | Self::UnsupportedFormat { .. }
            | Self::NoContentExtracted { .. }
            | Self::Config(_) => ErrorKind::InputValidation,
            Self::Connection { .. } | Self::Embedding { .. } | Self::VectorStore { .. } => {
                ErrorKind::ExternalService
            }
            Self::DimensionMismatch { .. }
            | Self::LengthMismatch { .. }
            | Self::EmbeddingCountMismatch { .. } => ErrorKind::DataIntegrity,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
