//! Data types for documents, chunks, vector records and search results.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A PDF on disk together with the source id its chunks are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Location of the file.
    pub path: PathBuf,
    /// Identifier attached to every chunk's payload. Defaults to the path.
    pub source_id: String,
}

impl Document {
    /// Create a document, falling back to the path when no `source_id` is given.
    pub fn new(path: impl AsRef<Path>, source_id: Option<&str>) -> Self {
        let path = path.as_ref().to_path_buf();
        let source_id = match source_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => path.to_string_lossy().into_owned(),
        };
        Self { path, source_id }
    }
}

/// A bounded segment of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Position of the chunk within its document, starting at zero.
    pub index: usize,
    /// The chunk text.
    pub text: String,
}

/// The payload stored next to every vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// The originating document identifier.
    pub source: String,
    /// The chunk text.
    pub text: String,
}

/// The persisted unit of the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Deterministic point id, see [`point_id`].
    pub id: Uuid,
    /// The embedding.
    pub vector: Vec<f32>,
    /// Source attribution and text.
    pub payload: Payload,
}

/// A record returned by a backend search, paired with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// The point id as reported by the backend.
    pub id: String,
    /// Cosine similarity (higher is more relevant).
    pub score: f32,
    /// The stored payload.
    pub payload: Payload,
}

/// Retrieval output handed to answer generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk texts in descending similarity order. A source may contribute several.
    pub contexts: Vec<String>,
    /// Distinct sources of the contexts. Order carries no meaning.
    pub sources: Vec<String>,
}

impl SearchResult {
    /// Reduce ranked hits to contexts and deduplicated sources.
    ///
    /// Hits with empty text are skipped, and so are their sources.
    pub fn from_points(points: impl IntoIterator<Item = ScoredPoint>) -> Self {
        let mut result = Self::default();
        let mut seen = HashSet::new();
        for point in points {
            if point.payload.text.is_empty() {
                continue;
            }
            let Payload { source, text } = point.payload;
            result.contexts.push(text);
            if !source.is_empty() && seen.insert(source.clone()) {
                result.sources.push(source);
            }
        }
        result
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Summary of one ingestion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Number of chunks written to the store.
    pub ingested: usize,
}

/// Backend-reported state of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Number of stored points.
    pub points_count: u64,
    /// Vector dimension the collection was created with.
    pub dimensions: usize,
    /// Backend status string, e.g. `green`.
    pub status: String,
}

/// Derive the point id for chunk `index` of `source_id`.
///
/// The id is a name-based UUID (v5, URL namespace) over `"{source_id}:{index}"`,
/// so ingesting the same source twice replaces its points.
pub fn point_id(source_id: &str, index: usize) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{source_id}:{index}").as_bytes())
}
