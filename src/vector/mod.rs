//! Vector search core: exact k-nearest-neighbor search over text embeddings.
//!
//! # Architecture
//! The index is flat: every stored vector is compared against the query with
//! squared Euclidean distance, so results are exact. Large indexes split the
//! scan across rayon workers and merge partial top-k sets; the ranking is
//! identical either way.
//!
//! Embeddings come from an [`EmbeddingGenerator`], an opaque oracle with a
//! stated output dimension.

mod embedding;
mod index;
mod types;

#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, SUPPORTED_MODELS, parse_embedding_model,
};
pub use index::{DEFAULT_PARALLEL_THRESHOLD, FlatIndex, squared_l2};
pub use types::{Distance, Neighbor, VectorDimension, VectorError};
