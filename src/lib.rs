/// The main library module for corpus-search
pub mod config;
pub mod corpus;
pub mod display;
pub mod error;
pub mod io;
#[cfg(feature = "http-server")]
pub mod server;
pub mod service;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use corpus::{Record, load_csv, records_from_texts};
pub use error::{SearchError, SearchResult};
pub use service::{DEFAULT_K, Match, SearchService, SearchServiceBuilder, ServiceOptions};
pub use vector::{EmbeddingGenerator, FastEmbedGenerator, VectorDimension, VectorError};
