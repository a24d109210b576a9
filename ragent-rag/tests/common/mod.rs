//! Shared fixtures: deterministic embedder, counting store, in-memory loader.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ragent_rag::{
    Collection, CollectionInfo, DocumentLoader, Embedder, EmbeddingProvider, FixedSizeChunker,
    InMemoryVectorStore, RagConfig, RagError, RagPipeline, Result, ScoredPoint, TaskType,
    VectorRecord, VectorStore,
};

pub const DIM: usize = 32;

/// Bag-of-words hashing embedder: texts sharing words point the same way.
pub struct HashEmbeddingProvider {
    dimensions: usize,
    pub calls: AtomicUsize,
    pub received: Mutex<Vec<(String, TaskType)>>,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0), received: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn bag_of_words(text: &str, dimensions: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dimensions];
    for word in text.split_whitespace() {
        let hash = word.bytes().fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        v[(hash % dimensions as u64) as usize] += 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push((text.to_string(), task));
        Ok(bag_of_words(text, self.dimensions))
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Returns vectors of a fixed, possibly wrong, length.
pub struct FixedLengthProvider(pub usize);

#[async_trait]
impl EmbeddingProvider for FixedLengthProvider {
    async fn embed(&self, _text: &str, _task: TaskType) -> Result<Vec<f32>> {
        Ok(vec![0.5; self.0])
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Fails on the `fail_at`-th call (zero-based).
pub struct FlakyProvider {
    pub fail_at: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FlakyProvider {
    async fn embed(&self, text: &str, _task: TaskType) -> Result<Vec<f32>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == self.fail_at {
            return Err(RagError::Embedding { provider: "flaky".into(), message: "boom".into() });
        }
        Ok(bag_of_words(text, DIM))
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// In-memory store that counts the calls reaching it.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryVectorStore,
    pub upserts: AtomicUsize,
    pub searches: AtomicUsize,
}

impl CountingStore {
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    fn backend(&self) -> &str {
        "counting"
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.inner.create_collection(name, dimensions).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        self.inner.collection_info(name).await
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(collection, records).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(collection, embedding, top_k).await
    }
}

/// Serves document text from a map instead of parsing files.
#[derive(Default)]
pub struct MapLoader {
    docs: HashMap<PathBuf, String>,
}

impl MapLoader {
    pub fn with(mut self, path: &str, text: impl Into<String>) -> Self {
        self.docs.insert(PathBuf::from(path), text.into());
        self
    }
}

#[async_trait]
impl DocumentLoader for MapLoader {
    async fn load(&self, path: &Path) -> Result<String> {
        self.docs
            .get(path)
            .cloned()
            .ok_or_else(|| RagError::FileNotFound { path: path.display().to_string() })
    }
}

/// Words cycled into a text of exactly `chars` characters.
pub fn text_of(chars: usize, words: &[&str]) -> String {
    words
        .iter()
        .cycle()
        .flat_map(|w| format!("{w} ").chars().collect::<Vec<_>>())
        .take(chars)
        .collect()
}

pub fn config() -> RagConfig {
    RagConfig::builder().embedding_dimensions(DIM).collection("test-docs").build().unwrap()
}

pub struct Harness {
    pub pipeline: RagPipeline,
    pub store: Arc<CountingStore>,
    pub provider: Arc<HashEmbeddingProvider>,
}

pub async fn harness(loader: MapLoader) -> Harness {
    harness_with(loader, Arc::new(HashEmbeddingProvider::new(DIM))).await
}

pub async fn harness_with(loader: MapLoader, provider: Arc<HashEmbeddingProvider>) -> Harness {
    let config = config();
    let store = Arc::new(CountingStore::default());
    let collection =
        Collection::open(store.clone(), config.collection.clone(), DIM).await.unwrap();
    let embedder = Embedder::new(provider.clone(), DIM);
    let pipeline = RagPipeline::builder()
        .chunker(Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)))
        .config(config)
        .loader(Arc::new(loader))
        .embedder(embedder)
        .collection(collection)
        .build()
        .unwrap();
    Harness { pipeline, store, provider }
}
