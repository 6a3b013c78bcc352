//! Embedding generation for corpus records and queries.
//!
//! The search core treats the embedding model as an opaque oracle: it is
//! asked for one vector per text and states the dimension it produces.
//! Single-text and batch calls are separate trait methods so callers never
//! have to reshape a query into a batch of one.

use crate::config::EmbeddingConfig;
use crate::vector::{VectorDimension, VectorError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

/// Model names accepted in `embedding.model`.
pub const SUPPORTED_MODELS: &str =
    "AllMiniLML6V2, AllMiniLML12V2, AllMpnetBaseV2, BGESmallENV15, BGEBaseENV15";

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe: a built search service shares one
/// generator across every concurrent query. Calls may block for an
/// unbounded time (model inference, network), callers bound them.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate the embedding for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError>;

    /// Generate embeddings for multiple texts, one per input, in input order.
    ///
    /// The default implementation calls [`embed`](Self::embed) per text;
    /// models with native batching should override it.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Dimension of every embedding produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;
}

/// FastEmbed-backed generator running a local ONNX sentence-embedding model.
///
/// The model handle needs `&mut` to embed, so it sits behind a mutex; the
/// lock is held for the duration of one inference call.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    dimension: VectorDimension,
    model_name: String,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load the model named in the embedding settings.
    ///
    /// The dimension is discovered by embedding a probe string, so any
    /// model fastembed can load reports its real output size.
    ///
    /// # Errors
    /// Returns an error if the model name is unknown or the model fails to
    /// initialize or download.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, VectorError> {
        let model = parse_embedding_model(&config.model)?;
        let cache_dir = config.models_dir();

        tracing::info!(
            "Loading embedding model {} (cache: {})",
            config.model,
            cache_dir.display()
        );

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(config.show_download_progress),
        )
        .map_err(|e| VectorError::ModelInit(e.to_string()))?;

        let probe = text_model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| VectorError::ModelInit(format!("probe embedding failed: {e}")))?;
        let dimension = probe
            .first()
            .map(Vec::len)
            .ok_or_else(|| VectorError::ModelInit("probe returned no embedding".to_string()))?;
        let dimension = VectorDimension::new(dimension)?;

        tracing::debug!("Embedding model {} produces {dimension}-d vectors", config.model);

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
            model_name: config.model.clone(),
        })
    }

    /// Name of the loaded model, as configured.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        let embeddings = self
            .model
            .lock()
            .embed(vec![text], None)
            .map_err(|e| VectorError::EmbeddingFailed(format!("Failed to embed text: {e}")))?;

        let embedding = embeddings.into_iter().next().ok_or_else(|| {
            VectorError::EmbeddingFailed("model returned no embedding".to_string())
        })?;
        self.dimension.validate_vector(&embedding)?;
        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        if embeddings.len() != texts.len() {
            return Err(VectorError::EmbeddingFailed(format!(
                "model returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Map a configured model name to a fastembed model.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "AllMpnetBaseV2" => Ok(EmbeddingModel::AllMpnetBaseV2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        other => Err(VectorError::UnknownModel(other.to_string(), SUPPORTED_MODELS)),
    }
}

/// Mock embedding generator for testing.
///
/// Produces deterministic unit vectors derived from the text bytes, so equal
/// texts always embed identically.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    #[must_use]
    pub fn with_dimension(dim: usize) -> Self {
        Self {
            dimension: VectorDimension::new(dim).unwrap(),
        }
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        let dim = self.dimension.get();
        let mut embedding = vec![0.1; dim];
        for (i, byte) in text.bytes().enumerate() {
            embedding[i % dim] += f32::from(byte) / 255.0;
        }

        // Normalize to unit length (like real embeddings)
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }
        Ok(embedding)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}
