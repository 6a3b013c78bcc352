//! Test: HTTP transport over a CSV-backed service

use crate::common::{StubEmbedder, write_csv};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use corpus_search::server::router;
use corpus_search::{SearchService, load_csv};
use std::sync::Arc;
use tower::ServiceExt;

async fn app() -> axum::Router {
    let (_dir, path) = write_csv("id,text\nA,cat\nB,dog\nC,car\n");
    let records = load_csv(&path, "text").unwrap();
    let service = SearchService::builder(records, Arc::new(StubEmbedder::animals()))
        .build()
        .await
        .unwrap();
    router(Arc::new(service))
}

fn query_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_query_returns_whole_rows() {
    let resp = app()
        .await
        .oneshot(query_request(r#"{"query": "feline"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    assert_eq!(v["matches"][0]["id"], "A");
    assert_eq!(v["matches"][0]["text"], "cat");
    assert_eq!(v["matches"][1]["id"], "B");
    assert_eq!(v["distances"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_query_field() {
    let resp = app()
        .await
        .oneshot(query_request(r#"{"k": 1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Query is required");
}

#[tokio::test]
async fn test_cors_headers_present() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let resp = app().await.oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("access-control-allow-origin"));
}
