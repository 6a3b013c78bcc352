//! Test: search service behaviour through the public API
//!
//! Builds services over stub oracles and checks ranking, lifecycle and
//! error reporting end to end.

use crate::common::{FailingEmbedder, StubEmbedder};
use corpus_search::{
    Record, SearchError, SearchService, ServiceOptions, records_from_texts,
};
use std::sync::Arc;

fn animal_records() -> Vec<Record> {
    vec![
        Record::new(0, "cat").with_field("id", "A"),
        Record::new(1, "dog").with_field("id", "B"),
        Record::new(2, "car").with_field("id", "C"),
    ]
}

async fn animal_service() -> SearchService {
    SearchService::builder(animal_records(), Arc::new(StubEmbedder::animals()))
        .build()
        .await
        .expect("animal corpus should build")
}

#[tokio::test]
async fn test_feline_matches_cat_then_dog() {
    let service = animal_service().await;

    let matches = service.query("feline", 2).await.unwrap();
    let ids: Vec<_> = matches.iter().map(|m| m.record.field("id").unwrap()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    assert!((matches[0].distance.get() - 0.01).abs() < 1e-6);
    assert!((matches[1].distance.get() - 0.81).abs() < 1e-6);
}

#[tokio::test]
async fn test_default_k_is_two() {
    let service = animal_service().await;
    let matches = service.query_default("feline").await.unwrap();
    assert_eq!(matches.len(), 2);
}

#[tokio::test]
async fn test_results_are_min_k_n_and_ascending() {
    let service = animal_service().await;

    for k in 1..=5 {
        let matches = service.query("feline", k).await.unwrap();
        assert_eq!(matches.len(), k.min(3));
        assert!(matches.iter().all(|m| m.distance.get() >= 0.0));
        assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
    assert!(service.query("feline", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_texts_rank_by_position() {
    let records = records_from_texts(["dog", "cat", "cat", "cat"]);
    let service = SearchService::builder(records, Arc::new(StubEmbedder::animals()))
        .build()
        .await
        .unwrap();

    let first = service.query("feline", 4).await.unwrap();
    let positions: Vec<_> = first.iter().map(|m| m.record.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 0]);

    // Same query, same index: same answer
    let second = service.query("feline", 4).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_corpus_is_ready_and_returns_nothing() {
    let embedder = Arc::new(StubEmbedder::animals());
    let service = SearchService::builder(Vec::new(), embedder.clone())
        .build()
        .await
        .expect("empty corpus builds by default");

    assert!(service.is_empty());
    let matches = service.query("feline", 2).await.unwrap();
    assert!(matches.is_empty());
    // Only the query was embedded
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn test_required_non_empty_corpus() {
    let options = ServiceOptions {
        require_non_empty: true,
        ..ServiceOptions::default()
    };
    let result = SearchService::builder(Vec::new(), Arc::new(StubEmbedder::animals()))
        .with_options(options)
        .build()
        .await;

    assert!(matches!(result, Err(SearchError::EmptyCorpus)));
}

#[tokio::test]
async fn test_blank_query_leaves_service_usable() {
    let service = animal_service().await;

    for blank in ["", "   ", "\t\n"] {
        let err = service.query(blank, 2).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput));
        assert_eq!(err.http_status(), 400);
    }

    let matches = service.query("feline", 1).await.unwrap();
    assert_eq!(matches[0].record.field("id"), Some("A"));
}

#[tokio::test]
async fn test_mixed_vector_lengths_fail_initialize() {
    // Stated dimension 3, one record comes back with 5 components
    let embedder = StubEmbedder::new(3)
        .with("short", &[0.0, 1.0, 2.0])
        .with("long", &[0.0, 1.0, 2.0, 3.0, 4.0]);
    let result = SearchService::builder(
        records_from_texts(["short", "long"]),
        Arc::new(embedder),
    )
    .build()
    .await;

    match result {
        Err(SearchError::DimensionMismatch { expected, actual }) => {
            assert_eq!((expected, actual), (3, 5));
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_oracle_failure_during_initialize() {
    let result = SearchService::builder(animal_records(), Arc::new(FailingEmbedder))
        .build()
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.status_code(), "EMBEDDING_FAILURE");
    assert!(err.to_string().contains("model unavailable"));
}

#[tokio::test]
async fn test_query_embedding_failure_is_per_request() {
    let service = animal_service().await;

    let err = service.query("unknown", 2).await.unwrap_err();
    assert!(matches!(err, SearchError::EmbeddingFailure { .. }));
    assert!(err.is_per_request());

    assert_eq!(service.query("feline", 2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_query_vector_of_wrong_length() {
    // Oracle states 2 but answers a query with 3 components
    let embedder = StubEmbedder::animals().with("odd", &[1.0, 2.0, 3.0]);
    let service = SearchService::builder(animal_records(), Arc::new(embedder))
        .build()
        .await
        .unwrap();

    let err = service.query("odd", 2).await.unwrap_err();
    assert!(matches!(
        err,
        SearchError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_share_one_service() {
    let service = Arc::new(animal_service().await);

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let k = 1 + i % 3;
                let matches = service.query("feline", k).await.unwrap();
                matches
                    .iter()
                    .map(|m| m.record.position)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let positions = handle.await.unwrap();
        let expected = [0, 1, 2];
        assert_eq!(positions, expected[..1 + i % 3]);
    }
}
