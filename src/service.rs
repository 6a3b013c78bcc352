//! Search service: embeds a corpus once, then answers ranked queries.
//!
//! The service has two states. [`SearchServiceBuilder`] is the
//! uninitialized one: it holds records and an embedding generator but
//! cannot be queried. [`SearchServiceBuilder::build`] consumes it and either
//! returns a ready [`SearchService`] or an error, so a half-built index is
//! never observable. The ready service is immutable; share it behind an
//! `Arc` and query it from any number of tasks without locking.
//!
//! Every embedding call runs on tokio's blocking pool under a timeout. A
//! timed-out call is reported as an embedding failure; the model call
//! itself is left to finish in the background.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::corpus::Record;
use crate::error::{SearchError, SearchResult};
use crate::vector::{
    DEFAULT_PARALLEL_THRESHOLD, Distance, EmbeddingGenerator, FlatIndex, VectorDimension,
    VectorError,
};

/// Number of matches returned when the caller does not ask for a count.
pub const DEFAULT_K: usize = 2;

/// Knobs for building and querying a service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Upper bound on one embedding call
    pub embed_timeout: Duration,

    /// Records per batch embedding call during build
    pub batch_size: usize,

    /// Fail the build on an empty corpus
    pub require_non_empty: bool,

    /// Index size at which searches scan in parallel
    pub parallel_threshold: usize,

    /// k used by [`SearchService::query_default`]
    pub default_k: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            embed_timeout: Duration::from_secs(30),
            batch_size: 256,
            require_non_empty: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            default_k: DEFAULT_K,
        }
    }
}

impl ServiceOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            embed_timeout: settings.embedding.timeout(),
            batch_size: settings.embedding.batch_size.max(1),
            require_non_empty: settings.corpus.require_non_empty,
            parallel_threshold: settings.search.parallel_threshold,
            default_k: settings.search.default_k,
        }
    }
}

/// One ranked result: a corpus record and its squared L2 distance to the
/// query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub record: &'a Record,
    pub distance: Distance,
}

/// Uninitialized service: records and an oracle, no index yet.
pub struct SearchServiceBuilder {
    records: Vec<Record>,
    generator: Arc<dyn EmbeddingGenerator>,
    options: ServiceOptions,
}

impl SearchServiceBuilder {
    pub fn new(records: Vec<Record>, generator: Arc<dyn EmbeddingGenerator>) -> Self {
        Self {
            records,
            generator,
            options: ServiceOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    /// Embed every record and build the index.
    ///
    /// # Errors
    /// - `EmptyCorpus` if the corpus is empty and `require_non_empty` is set
    /// - `EmbeddingFailure` if the oracle errors, times out or returns the
    ///   wrong number of vectors
    /// - `DimensionMismatch` if a vector's length differs from the oracle's
    ///   stated dimension
    pub async fn build(self) -> SearchResult<SearchService> {
        let Self {
            records,
            generator,
            options,
        } = self;

        if records.is_empty() && options.require_non_empty {
            return Err(SearchError::EmptyCorpus);
        }

        let dimension = generator.dimension();
        let batch_size = options.batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(records.len());

        for (batch_index, batch) in records.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
            let oracle = Arc::clone(&generator);
            let embeddings = run_oracle(options.embed_timeout, move || {
                let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                oracle.embed_batch(&refs)
            })
            .await?;

            if embeddings.len() != batch.len() {
                return Err(SearchError::embedding(format!(
                    "model returned {} embeddings for a batch of {} records",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (record, embedding) in batch.iter().zip(&embeddings) {
                check_dimension(dimension, record, embedding)?;
            }

            tracing::debug!(
                "Embedded batch {} ({} records)",
                batch_index + 1,
                batch.len()
            );
            vectors.extend(embeddings);
        }

        let index = FlatIndex::build_with_dimension(dimension, &vectors)?
            .with_parallel_threshold(options.parallel_threshold);

        tracing::info!(
            "Search index ready: {} records, {}-d vectors",
            index.len(),
            dimension
        );

        Ok(SearchService {
            records,
            index,
            generator,
            embed_timeout: options.embed_timeout,
            default_k: options.default_k,
        })
    }
}

fn check_dimension(
    dimension: VectorDimension,
    record: &Record,
    embedding: &[f32],
) -> SearchResult<()> {
    dimension.validate_vector(embedding).map_err(|e| {
        tracing::warn!("Record {} produced an unusable embedding: {e}", record.position);
        SearchError::from(e)
    })
}

/// Ready service: an immutable index plus the records it was built from.
pub struct SearchService {
    records: Vec<Record>,
    index: FlatIndex,
    generator: Arc<dyn EmbeddingGenerator>,
    embed_timeout: Duration,
    default_k: usize,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("records", &self.records.len())
            .field("dimension", &self.index.dimension())
            .field("embed_timeout", &self.embed_timeout)
            .field("default_k", &self.default_k)
            .finish()
    }
}

impl SearchService {
    /// Start building a service over `records`.
    pub fn builder(
        records: Vec<Record>,
        generator: Arc<dyn EmbeddingGenerator>,
    ) -> SearchServiceBuilder {
        SearchServiceBuilder::new(records, generator)
    }

    /// Build a service using the options from `settings`.
    pub async fn from_settings(
        settings: &Settings,
        records: Vec<Record>,
        generator: Arc<dyn EmbeddingGenerator>,
    ) -> SearchResult<Self> {
        SearchServiceBuilder::new(records, generator)
            .with_options(ServiceOptions::from_settings(settings))
            .build()
            .await
    }

    /// Return the `k` records nearest to `text`, nearest first.
    ///
    /// Equal distances are ordered by record position. An empty result is
    /// not an error.
    ///
    /// # Errors
    /// - `InvalidInput` if `text` is empty or whitespace
    /// - `EmbeddingFailure` if embedding the query fails or times out
    /// - `DimensionMismatch` if the query vector does not fit the index
    pub async fn query(&self, text: &str, k: usize) -> SearchResult<Vec<Match<'_>>> {
        if text.trim().is_empty() {
            return Err(SearchError::InvalidInput);
        }

        let oracle = Arc::clone(&self.generator);
        let owned = text.to_string();
        let query_vector = run_oracle(self.embed_timeout, move || oracle.embed(&owned)).await?;

        let neighbors = self.index.search(&query_vector, k)?;
        let matches: Vec<Match<'_>> = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                self.records.get(neighbor.position).map(|record| Match {
                    record,
                    distance: neighbor.distance,
                })
            })
            .collect();

        tracing::debug!("Query '{text}' (k={k}) returned {} matches", matches.len());
        Ok(matches)
    }

    /// [`query`](Self::query) with the configured default k.
    pub async fn query_default(&self, text: &str) -> SearchResult<Vec<Match<'_>>> {
        self.query(text, self.default_k).await
    }

    #[must_use]
    pub fn default_k(&self) -> usize {
        self.default_k
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimension of the oracle's vectors.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.generator.dimension()
    }
}

/// Run a blocking oracle call off the async runtime, bounded by `timeout`.
async fn run_oracle<T, F>(timeout: Duration, call: F) -> SearchResult<T>
where
    F: FnOnce() -> Result<T, VectorError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(e))) => Err(e.into()),
        Ok(Err(join_error)) => Err(SearchError::embedding(format!(
            "embedding task aborted: {join_error}"
        ))),
        Err(_) => {
            tracing::warn!("Embedding call timed out after {timeout:?}");
            Err(SearchError::embedding(format!(
                "embedding call timed out after {} ms",
                timeout.as_millis()
            )))
        }
    }
}
