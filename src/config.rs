//! Configuration module for the corpus search service.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CS_` and use double underscores
//! to separate nested levels:
//! - `CS_SEARCH__DEFAULT_K=5` sets `search.default_k`
//! - `CS_EMBEDDING__TIMEOUT_MS=5000` sets `embedding.timeout_ms`
//! - `CS_CORPUS__TEXT_COLUMN=Description` sets `corpus.text_column`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the settings file, searched for from the cwd upwards.
pub const CONFIG_DIR: &str = ".corpus-search";

const ENV_PREFIX: &str = "CS_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Corpus source settings
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Query settings
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorpusConfig {
    /// CSV file holding one record per row
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,

    /// Header name of the column that gets embedded
    #[serde(default = "default_text_column")]
    pub text_column: String,

    /// Refuse to start with an empty corpus
    #[serde(default = "default_false")]
    pub require_non_empty: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Upper bound on a single embedding call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Records embedded per oracle call while building the index
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Where downloaded models are cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Show a progress bar while a model downloads
    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Matches returned when a request does not ask for a count
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Index size at which searches scan in parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/corpus.csv")
}
fn default_text_column() -> String {
    "text".to_string()
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_batch_size() -> usize {
    256
}
fn default_k() -> usize {
    2
}
fn default_parallel_threshold() -> usize {
    crate::vector::DEFAULT_PARALLEL_THRESHOLD
}
fn default_bind_address() -> String {
    "127.0.0.1:5001".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            corpus: CorpusConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
            text_column: default_text_column(),
            require_non_empty: false,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            timeout_ms: default_timeout_ms(),
            batch_size: default_batch_size(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

impl EmbeddingConfig {
    /// Timeout applied to every embedding call.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Model cache directory: the configured one, else the user cache dir.
    pub fn models_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|dir| dir.join("corpus-search").join("models"))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for the config directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for the config directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'corpus-search init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), crate::SearchError> {
        let invalid = |reason: &str| crate::SearchError::Config {
            reason: reason.to_string(),
        };
        if self.search.default_k == 0 {
            return Err(invalid("search.default_k must be at least 1"));
        }
        if self.embedding.batch_size == 0 {
            return Err(invalid("embedding.batch_size must be at least 1"));
        }
        if self.embedding.timeout_ms == 0 {
            return Err(invalid("embedding.timeout_ms must be at least 1"));
        }
        if self.corpus.text_column.trim().is_empty() {
            return Err(invalid("corpus.text_column cannot be empty"));
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create the settings file under `root`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# corpus-search configuration file

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[corpus]
# CSV file with a header row, one record per row
path = "data/corpus.csv"

# Column whose text is embedded and searched
text_column = "text"

# Fail at startup when the corpus has no records
require_non_empty = false

[embedding]
# Model to use for embeddings
# One of: AllMiniLML6V2, AllMiniLML12V2, AllMpnetBaseV2, BGESmallENV15, BGEBaseENV15
model = "AllMiniLML6V2"

# Upper bound on one embedding call in milliseconds
timeout_ms = 30000

# Records embedded per model call while building the index
batch_size = 256

# Model cache directory (defaults to the user cache directory)
# cache_dir = "/path/to/models"

show_download_progress = true

[search]
# Matches returned when a request does not say how many
default_k = 2

# Index size at which searches are split across threads
parallel_threshold = 10000

[server]
# HTTP server bind address
bind = "127.0.0.1:5001"
"#;

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
