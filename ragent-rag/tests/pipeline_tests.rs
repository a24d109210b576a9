//! End-to-end ingestion and retrieval over the in-memory store.

mod common;

use std::sync::Arc;

use common::{
    CountingStore, DIM, FixedLengthProvider, HashEmbeddingProvider, MapLoader, config, harness,
    text_of,
};
use ragent_rag::{
    Collection, Embedder, ErrorKind, FixedSizeChunker, RagConfig, RagError, RagPipeline,
    VectorStore, point_id,
};

const RUST_WORDS: &[&str] = &["ownership", "borrowing", "lifetimes", "traits", "cargo"];
const COOKING_WORDS: &[&str] = &["flour", "butter", "oven", "whisk", "sugar"];

#[tokio::test]
async fn ingest_writes_one_point_per_chunk() {
    let h = harness(MapLoader::default().with("a.pdf", text_of(2000, RUST_WORDS))).await;

    let report = h.pipeline.ingest("a.pdf", Some("doc-A")).await.unwrap();
    assert_eq!(report.ingested, 3);

    let info = h.pipeline.collection().info().await.unwrap();
    assert_eq!(info.points_count, 3);

    let hits = h.store.search("test-docs", &[1.0; DIM], 10).await.unwrap();
    let mut ids: Vec<String> = hits.iter().map(|p| p.id.clone()).collect();
    ids.sort();
    let mut expected: Vec<String> = (0..3).map(|i| point_id("doc-A", i).to_string()).collect();
    expected.sort();
    assert_eq!(ids, expected);
    assert!(hits.iter().all(|p| p.payload.source == "doc-A"));
}

#[tokio::test]
async fn reingesting_a_source_replaces_its_points() {
    let h = harness(MapLoader::default().with("a.pdf", text_of(2000, RUST_WORDS))).await;

    h.pipeline.ingest("a.pdf", Some("doc-A")).await.unwrap();
    let report = h.pipeline.ingest("a.pdf", Some("doc-A")).await.unwrap();

    assert_eq!(report.ingested, 3);
    assert_eq!(h.pipeline.collection().info().await.unwrap().points_count, 3);
}

#[tokio::test]
async fn source_id_defaults_to_path() {
    let h = harness(MapLoader::default().with("notes/intro.pdf", text_of(300, RUST_WORDS))).await;

    h.pipeline.ingest("notes/intro.pdf", None).await.unwrap();
    let result = h.pipeline.query("ownership traits", 3).await.unwrap();

    assert_eq!(result.sources, vec!["notes/intro.pdf".to_string()]);
}

#[tokio::test]
async fn query_ranks_the_matching_source_first() {
    let loader = MapLoader::default()
        .with("rust.pdf", text_of(1500, RUST_WORDS))
        .with("cake.pdf", text_of(1500, COOKING_WORDS));
    let h = harness(loader).await;
    h.pipeline.ingest("rust.pdf", Some("rust")).await.unwrap();
    h.pipeline.ingest("cake.pdf", Some("cake")).await.unwrap();

    let result = h.pipeline.query("whisk the butter and sugar", 5).await.unwrap();

    assert!(result.contexts.len() <= 5);
    assert!(result.sources.len() <= 2);
    assert_eq!(result.sources[0], "cake");
    assert!(result.contexts[0].contains("butter"));
}

#[tokio::test]
async fn top_k_out_of_range_is_rejected_before_any_call() {
    let h = harness(MapLoader::default()).await;

    for top_k in [0, 21] {
        let err = h.pipeline.query("anything", top_k).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)), "top_k {top_k}: {err}");
        assert_eq!(err.kind(), ErrorKind::InputValidation);
    }
    assert_eq!(h.provider.calls(), 0);
    assert_eq!(h.store.searches(), 0);
}

#[tokio::test]
async fn query_against_empty_collection_is_empty() {
    let h = harness(MapLoader::default()).await;

    let result = h.pipeline.query_default("is anything here?").await.unwrap();

    assert!(result.is_empty());
    assert!(result.sources.is_empty());
    assert_eq!(h.store.searches(), 1);
}

#[tokio::test]
async fn blank_document_writes_nothing() {
    let h = harness(MapLoader::default().with("blank.pdf", "  \n\n  ")).await;

    let err = h.pipeline.ingest("blank.pdf", None).await.unwrap_err();

    assert!(matches!(
        err,
        RagError::NoContentExtracted { ref source_id } if source_id == "blank.pdf"
    ));
    assert_eq!(h.provider.calls(), 0);
    assert_eq!(h.store.upserts(), 0);
}

#[tokio::test]
async fn missing_file_is_reported() {
    let h = harness(MapLoader::default()).await;

    let err = h.pipeline.ingest("missing.pdf", None).await.unwrap_err();

    assert!(matches!(err, RagError::FileNotFound { ref path } if path == "missing.pdf"));
    assert_eq!(h.store.upserts(), 0);
}

#[tokio::test]
async fn wrong_dimension_provider_writes_nothing() {
    let config = config();
    let store = Arc::new(CountingStore::default());
    let collection = Collection::open(store.clone(), config.collection.clone(), DIM).await.unwrap();
    // The embedder is configured correctly, the provider lies about its output.
    let embedder = Embedder::new(Arc::new(FixedLengthProvider(DIM + 4)), DIM);
    let pipeline = RagPipeline::builder()
        .config(config)
        .loader(Arc::new(MapLoader::default().with("a.pdf", text_of(2000, RUST_WORDS))))
        .chunker(Arc::new(FixedSizeChunker::new(1000, 200)))
        .embedder(embedder)
        .collection(collection)
        .build()
        .unwrap();

    let err = pipeline.ingest("a.pdf", None).await.unwrap_err();

    assert!(matches!(err, RagError::DimensionMismatch { expected: 32, actual: 36, .. }));
    assert_eq!(store.upserts(), 0);
    assert_eq!(pipeline.collection().info().await.unwrap().points_count, 0);
}

#[tokio::test]
async fn builder_rejects_disagreeing_dimensions() {
    let store = Arc::new(CountingStore::default());
    let collection = Collection::open(store, "docs", DIM).await.unwrap();
    let embedder = Embedder::new(Arc::new(HashEmbeddingProvider::new(DIM * 2)), DIM * 2);

    let err = RagPipeline::builder()
        .config(config())
        .loader(Arc::new(MapLoader::default()))
        .chunker(Arc::new(FixedSizeChunker::new(1000, 200)))
        .embedder(embedder)
        .collection(collection)
        .build()
        .err()
        .unwrap();

    assert!(matches!(err, RagError::DimensionMismatch { expected: 32, actual: 64, .. }));
}

#[tokio::test]
async fn builder_rejects_config_dimension_that_disagrees_with_collection() {
    let store = Arc::new(CountingStore::default());
    let collection = Collection::open(store.clone(), "docs", DIM).await.unwrap();
    let embedder = Embedder::new(Arc::new(HashEmbeddingProvider::new(DIM)), DIM);
    let config = RagConfig::builder()
        .embedding_dimensions(DIM * 2)
        .collection("docs")
        .build()
        .unwrap();

    let err = RagPipeline::builder()
        .config(config)
        .loader(Arc::new(MapLoader::default()))
        .chunker(Arc::new(FixedSizeChunker::new(1000, 200)))
        .embedder(embedder)
        .collection(collection)
        .build()
        .err()
        .unwrap();

    assert!(matches!(
        err,
        RagError::DimensionMismatch { ref context, expected: 32, actual: 64 }
            if context.starts_with("config")
    ));
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    assert_eq!(store.upserts() + store.searches(), 0);
}

#[tokio::test]
async fn builder_requires_every_component() {
    let err = RagPipeline::builder().config(config()).build().err().unwrap();
    assert!(matches!(err, RagError::Config(_)));
}

#[tokio::test]
async fn concurrent_ingests_share_the_store() {
    let loader = MapLoader::default()
        .with("a.pdf", text_of(2000, RUST_WORDS))
        .with("b.pdf", text_of(2000, COOKING_WORDS));
    let h = harness(loader).await;

    let (a, b) = tokio::join!(h.pipeline.ingest("a.pdf", None), h.pipeline.ingest("b.pdf", None));

    assert_eq!(a.unwrap().ingested + b.unwrap().ingested, 6);
    assert_eq!(h.pipeline.collection().info().await.unwrap().points_count, 6);
}
