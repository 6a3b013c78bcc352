//! Test: loading a CSV corpus from disk and searching it

use crate::common::{StubEmbedder, write_csv};
use corpus_search::{SearchError, SearchService, load_csv};
use std::sync::Arc;

#[test]
fn test_load_csv_keeps_row_order_and_columns() {
    let (_dir, path) = write_csv("Item,Description\nA,cat\nB,dog\nC,car\n");

    let records = load_csv(&path, "Description").unwrap();
    assert_eq!(records.len(), 3);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.position, i);
    }
    assert_eq!(records[2].field("Item"), Some("C"));
    assert_eq!(records[2].text, "car");
}

#[test]
fn test_missing_file_reports_path() {
    let err = load_csv("/definitely/not/here/corpus.csv", "text").unwrap_err();
    match &err {
        SearchError::CorpusLoad { path, .. } => {
            assert!(path.ends_with("corpus.csv"));
        }
        other => panic!("expected CorpusLoad, got {other:?}"),
    }
    assert_eq!(err.status_code(), "CORPUS_LOAD_ERROR");
}

#[test]
fn test_wrong_text_column() {
    let (_dir, path) = write_csv("Item,Description\nA,cat\n");
    let err = load_csv(&path, "text").unwrap_err();
    assert!(err.to_string().contains("'text'"));
}

#[tokio::test]
async fn test_csv_corpus_end_to_end() {
    let (_dir, path) = write_csv("Item,Description\r\nA,cat\r\nB,dog\r\nC,car\r\n");
    let records = load_csv(&path, "Description").unwrap();

    let service = SearchService::builder(records, Arc::new(StubEmbedder::animals()))
        .build()
        .await
        .unwrap();

    let matches = service.query("feline", 2).await.unwrap();
    let items: Vec<_> = matches
        .iter()
        .map(|m| m.record.field("Item").unwrap())
        .collect();
    assert_eq!(items, vec!["A", "B"]);
}
