use crate::pipeline::ChunkPolicy;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Chunking knobs describe a window that can never advance.
    #[error("CHUNK_OVERLAP ({overlap}) must be smaller than CHUNK_SIZE ({size})")]
    OverlapExceedsChunkSize {
        /// Configured overlap in characters.
        overlap: usize,
        /// Configured chunk size in characters.
        size: usize,
    },
}

/// Default chunk window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1500;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 300;
/// Default cap on the number of chunks emitted per document.
pub const DEFAULT_MAX_CHUNKS: usize = 2000;
/// Default timeout applied to every outbound HTTP client, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default number of chunk texts sent per embedding request.
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 64;
/// Default chat model used for profile descriptions.
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Runtime configuration for the ingestion pipeline.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the Qdrant instance that stores embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection used for document chunks.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Base URL of the embedding service, for HTTP-backed providers.
    pub embedding_url: Option<String>,
    /// Optional bearer token for the embedding service.
    pub embedding_api_key: Option<String>,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Number of chunk texts submitted per embedding request.
    pub embedding_batch_size: usize,
    /// Maximum characters per chunk (defaults to [`DEFAULT_CHUNK_SIZE`]).
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks (defaults to [`DEFAULT_CHUNK_OVERLAP`]).
    pub chunk_overlap: usize,
    /// Cap on chunks emitted per document (defaults to [`DEFAULT_MAX_CHUNKS`]).
    pub max_chunks: usize,
    /// Base URL of the chat-completion service used for profile descriptions.
    pub chat_url: Option<String>,
    /// Optional bearer token for the chat-completion service.
    pub chat_api_key: Option<String>,
    /// Chat model used to generate profile descriptions.
    pub chat_model: String,
    /// Timeout applied to every outbound HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

/// Supported embedding backends for the processing pipeline.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible embeddings endpoint reached over HTTP.
    OpenAI,
    /// Deterministic local hashing client, useful offline and in tests.
    Deterministic,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            qdrant_url: load_env("QDRANT_URL")?,
            qdrant_collection_name: load_env("QDRANT_COLLECTION_NAME")?,
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            embedding_provider: load_env("EMBEDDING_PROVIDER")?
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
            embedding_url: load_env_optional("EMBEDDING_URL"),
            embedding_api_key: load_env_optional("EMBEDDING_API_KEY"),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", load_env("EMBEDDING_DIMENSION")?)?,
            embedding_batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", DEFAULT_EMBEDDING_BATCH_SIZE)?,
            chunk_size: parse_env_or("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_env_or("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            max_chunks: parse_env_or("MAX_CHUNKS", DEFAULT_MAX_CHUNKS)?,
            chat_url: load_env_optional("CHAT_URL"),
            chat_api_key: load_env_optional("CHAT_API_KEY"),
            chat_model: load_env_optional("CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            request_timeout_secs: parse_env_or("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Chunking policy derived from the loaded knobs.
    pub fn chunk_policy(&self) -> ChunkPolicy {
        ChunkPolicy {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            max_chunks: self.max_chunks,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_SIZE".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapExceedsChunkSize {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
            });
        }
        if self.max_chunks == 0 {
            return Err(ConfigError::InvalidValue("MAX_CHUNKS".to_string()));
        }
        if self.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()));
        }
        if self.embedding_batch_size == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_BATCH_SIZE".to_string()));
        }
        Ok(())
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => parse_env(key, value),
        None => Ok(default),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "deterministic" => Ok(Self::Deterministic),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        embedding_provider = ?config.embedding_provider,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        max_chunks = config.max_chunks,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
