//! Type-safe wrappers and core types for the flat vector index.
//!
//! Positions and distances get small newtypes so the ranking order of a
//! search result is defined in exactly one place.

use std::cmp::Ordering;
use thiserror::Error;

/// Type-safe wrapper for vector dimensions.
///
/// A dimension is always non-zero; an index built from zero-length vectors
/// has nothing to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Squared Euclidean distance between a query and a stored vector.
///
/// The square root is never taken: ordering is identical and the value
/// matches what a flat L2 index conventionally reports.
#[derive(Debug, Clone, Copy)]
pub struct Distance(f32);

impl Distance {
    /// Wraps a squared distance. A NaN has its sign bit cleared so it
    /// orders after `+inf`; a negative NaN (`inf - inf` on x86) would
    /// otherwise rank ahead of every real distance.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        if value.is_nan() {
            Self(value.abs())
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// Returns the underlying squared distance.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }
}

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Distance {}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Distance {
    // IEEE total order; `new` clears the NaN sign bit so NaN sorts last.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One search hit: the build-time position of a stored vector and its
/// distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: Distance,
}

impl Neighbor {
    #[must_use]
    pub const fn new(position: usize, distance: Distance) -> Self {
        Self { position, distance }
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    /// Ranking order: nearer first, then lower position first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Failed to initialize embedding model: {0}\nSuggestion: Ensure you have internet connection for first-time model download"
    )]
    ModelInit(String),

    #[error("Unknown embedding model '{0}'\nSuggestion: Use one of {1}")]
    UnknownModel(String, &'static str),
}
