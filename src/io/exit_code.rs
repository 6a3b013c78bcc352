//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - query answered with at least one match
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - the service could not be built
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::SearchError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Query ran but matched nothing (code 3)
    NotFound = 3,

    /// Caller input was rejected (code 4)
    InvalidInput = 4,

    /// Corpus file I/O or parse error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Embedding model failed or timed out (code 7)
    EmbeddingError = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a completed query: `Success` with matches, `NotFound`
    /// when the result is empty.
    pub fn from_match_count(count: usize) -> Self {
        if count == 0 {
            ExitCode::NotFound
        } else {
            ExitCode::Success
        }
    }

    /// Convert a `SearchError` to the appropriate exit code.
    pub fn from_error(error: &SearchError) -> Self {
        match error {
            SearchError::InvalidInput | SearchError::MalformedRequest { .. } => {
                ExitCode::InvalidInput
            }
            SearchError::EmbeddingFailure { .. } => ExitCode::EmbeddingError,
            SearchError::CorpusLoad { .. } => ExitCode::IoError,
            SearchError::Config { .. } => ExitCode::ConfigError,

            // The service never reached Ready
            SearchError::EmptyCorpus => ExitCode::BlockingError,

            SearchError::DimensionMismatch { .. } => ExitCode::GeneralError,
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "No matches",
            ExitCode::InvalidInput => "Invalid input",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::EmbeddingError => "Embedding error",
        }
    }
}
