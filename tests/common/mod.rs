//! Shared embedding oracles for integration tests.
#![allow(dead_code)]

use corpus_search::{EmbeddingGenerator, VectorDimension, VectorError};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Oracle backed by a fixed text-to-vector table.
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimension: VectorDimension,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension: VectorDimension::new(dimension).expect("non-zero dimension"),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: &[f32]) -> Self {
        self.vectors.insert(text.to_string(), vector.to_vec());
        self
    }

    /// The cat/dog/car table used across the tests.
    pub fn animals() -> Self {
        Self::new(2)
            .with("cat", &[0.0, 0.0])
            .with("dog", &[1.0, 0.0])
            .with("car", &[5.0, 5.0])
            .with("feline", &[0.1, 0.0])
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingGenerator for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| VectorError::EmbeddingFailed(format!("no vector for '{text}'")))
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Oracle that always fails.
pub struct FailingEmbedder;

impl EmbeddingGenerator for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, VectorError> {
        Err(VectorError::EmbeddingFailed("model unavailable".to_string()))
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(2).expect("non-zero dimension")
    }
}

/// Write `content` to a CSV file inside a fresh temp dir.
pub fn write_csv(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("corpus.csv");
    fs::write(&path, content).expect("Failed to write corpus");
    (dir, path)
}
