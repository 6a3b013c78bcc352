//! Exact brute-force k-nearest-neighbor index.
//!
//! Every stored vector is compared against the query with squared
//! Euclidean distance; there is no approximation structure. Vectors live
//! in one contiguous row-major buffer so a scan is a linear walk over
//! memory.
//!
//! # Ranking
//! Results are ordered by ascending distance, ties broken by ascending
//! build-time position. Top-k selection uses a bounded max-heap keyed on
//! that same order, so the selected set is unique and the parallel scan
//! returns exactly what the sequential scan returns.

use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::vector::{Distance, Neighbor, VectorDimension, VectorError};

/// Number of stored vectors at which a search switches to the parallel scan.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// Rows handed to each rayon task during a parallel scan.
const CHUNK_ROWS: usize = 1024;

/// Immutable flat index over vectors of a single dimension.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    /// Row-major vector data, `len * dimension` floats
    data: Vec<f32>,

    /// `None` only for an index built from no vectors and no stated dimension
    dimension: Option<VectorDimension>,

    len: usize,

    parallel_threshold: usize,
}

impl FlatIndex {
    /// Builds an index, taking the dimension from the first vector.
    ///
    /// An empty input produces an empty index that answers every query
    /// with no matches.
    ///
    /// # Errors
    /// `InvalidDimension` if the first vector is empty, `DimensionMismatch`
    /// if any later vector differs in length from the first.
    pub fn build<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Self, VectorError> {
        let Some(first) = vectors.first() else {
            return Ok(Self::empty(None));
        };
        let dimension = VectorDimension::new(first.as_ref().len())?;
        Self::build_with_dimension(dimension, vectors)
    }

    /// Builds an index whose dimension is known up front, e.g. the stated
    /// dimension of an embedding model. Every vector is checked against it.
    pub fn build_with_dimension<V: AsRef<[f32]>>(
        dimension: VectorDimension,
        vectors: &[V],
    ) -> Result<Self, VectorError> {
        let mut data = Vec::with_capacity(vectors.len() * dimension.get());
        for vector in vectors {
            let vector = vector.as_ref();
            dimension.validate_vector(vector)?;
            data.extend_from_slice(vector);
        }

        Ok(Self {
            data,
            dimension: Some(dimension),
            len: vectors.len(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    fn empty(dimension: Option<VectorDimension>) -> Self {
        Self {
            data: Vec::new(),
            dimension,
            len: 0,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Sets the vector count at which searches scan in parallel.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn dimension(&self) -> Option<VectorDimension> {
        self.dimension
    }

    /// Finds the `k` stored vectors nearest to `query`.
    ///
    /// `k` is clamped to the number of stored vectors. An empty index or
    /// `k == 0` yields an empty result, never an error.
    ///
    /// # Returns
    /// Neighbors ordered by ascending squared distance, ties by ascending
    /// position.
    ///
    /// # Errors
    /// `DimensionMismatch` if the query length differs from the index
    /// dimension.
    #[must_use = "Search results should be mapped back to their records"]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };
        if self.len == 0 {
            return Ok(Vec::new());
        }
        dimension.validate_vector(query)?;

        let k = k.min(self.len);
        if k == 0 {
            return Ok(Vec::new());
        }

        let heap = if self.len >= self.parallel_threshold {
            self.scan_parallel(dimension.get(), query, k)
        } else {
            scan_rows(self.data.chunks_exact(dimension.get()), 0, query, k)
        };

        // into_sorted_vec yields ascending order under Neighbor's Ord
        Ok(heap.into_sorted_vec())
    }

    /// Split-scan: each chunk keeps a partial top-k, partials are merged
    /// with the same bounded heap.
    fn scan_parallel(&self, dim: usize, query: &[f32], k: usize) -> BinaryHeap<Neighbor> {
        self.data
            .par_chunks(CHUNK_ROWS * dim)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                scan_rows(chunk.chunks_exact(dim), chunk_index * CHUNK_ROWS, query, k)
            })
            .reduce(BinaryHeap::new, |mut merged, partial| {
                for neighbor in partial {
                    push_bounded(&mut merged, neighbor, k);
                }
                merged
            })
    }
}

/// Scans rows whose first position is `offset`, keeping the `k` best.
fn scan_rows<'a>(
    rows: impl Iterator<Item = &'a [f32]>,
    offset: usize,
    query: &[f32],
    k: usize,
) -> BinaryHeap<Neighbor> {
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (i, row) in rows.enumerate() {
        let neighbor = Neighbor::new(offset + i, Distance::new(squared_l2(query, row)));
        push_bounded(&mut heap, neighbor, k);
    }
    heap
}

/// Max-heap insert that evicts the worst entry once the heap exceeds `k`.
fn push_bounded(heap: &mut BinaryHeap<Neighbor>, neighbor: Neighbor, k: usize) {
    if heap.len() == k {
        match heap.peek() {
            Some(worst) if neighbor < *worst => {
                heap.pop();
            }
            _ => return,
        }
    }
    heap.push(neighbor);
}

/// Σ(a_i − b_i)² over two equal-length slices.
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
