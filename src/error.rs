//! Error types for the corpus search service
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages. Each variant carries a
//! stable status code so the transport layer can map it consistently.

use crate::vector::VectorError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for building and querying the search service
#[derive(Error, Debug)]
pub enum SearchError {
    /// Caller-supplied query text was empty or blank
    #[error("Query is required")]
    InvalidInput,

    /// Request body could not be decoded
    #[error("Malformed request body: {reason}")]
    MalformedRequest { reason: String },

    /// The embedding oracle failed, timed out or returned unusable output
    #[error("Embedding failed: {reason}")]
    EmbeddingFailure { reason: String },

    /// A vector disagrees with the index's fixed dimension
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The deployment requires a non-empty corpus and got none
    #[error("Corpus is empty but a non-empty corpus is required")]
    EmptyCorpus,

    /// Corpus file could not be read or parsed
    #[error("Failed to load corpus from '{path}': {reason}")]
    CorpusLoad { path: PathBuf, reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl SearchError {
    pub fn embedding(reason: impl Into<String>) -> Self {
        Self::EmbeddingFailure {
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::MalformedRequest { .. } => "MALFORMED_REQUEST",
            Self::EmbeddingFailure { .. } => "EMBEDDING_FAILURE",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::EmptyCorpus => "EMPTY_CORPUS",
            Self::CorpusLoad { .. } => "CORPUS_LOAD_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// HTTP status the transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput | Self::MalformedRequest { .. } => 400,
            _ => 500,
        }
    }

    /// Whether the service stays usable after this error.
    pub fn is_per_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput
                | Self::MalformedRequest { .. }
                | Self::EmbeddingFailure { .. }
                | Self::DimensionMismatch { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidInput => vec!["Provide a non-empty query string"],
            Self::MalformedRequest { .. } => vec![
                "Send a JSON object such as {\"query\": \"text\", \"k\": 2}",
                "k must be a non-negative integer",
            ],
            Self::EmbeddingFailure { .. } => vec![
                "Check that the embedding model is downloaded and loads correctly",
                "Raise embedding.timeout_ms if the model is slow on this machine",
            ],
            Self::DimensionMismatch { .. } => vec![
                "Ensure the corpus and queries are embedded with the same model",
            ],
            Self::EmptyCorpus => vec![
                "Add records to the corpus file",
                "Set corpus.require_non_empty = false to allow an empty corpus",
            ],
            Self::CorpusLoad { .. } => vec![
                "Check that the corpus file exists and is valid CSV",
                "Check that corpus.text_column names a column in the header row",
            ],
            Self::Config { .. } => vec![
                "Run 'corpus-search init --force' to regenerate the settings file",
            ],
        }
    }
}

impl From<VectorError> for SearchError {
    fn from(error: VectorError) -> Self {
        match error {
            VectorError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            other => Self::EmbeddingFailure {
                reason: other.to_string(),
            },
        }
    }
}

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;
