//! Embedding service configuration.

use std::fmt;
use std::time::Duration;

use settings::{env_optional, env_or_default, env_parse_or, ConfigError, FromEnv};

/// Default hosted inference endpoint
pub const DEFAULT_ENDPOINT: &str = "https://router.huggingface.co/hf-inference";

/// Default sentence-transformers model (384 dimensions)
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output size of [`DEFAULT_MODEL`]
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Settings for [`crate::HuggingFaceEmbedder`].
///
/// Environment variables:
/// - `HF_TOKEN` (optional) - bearer token for the inference service
/// - `HF_MODEL` (default: all-MiniLM-L6-v2)
/// - `HF_ENDPOINT` (default: the hosted hf-inference router)
/// - `HF_EMBEDDING_DIMENSIONS` (default: 384)
/// - `HF_TIMEOUT_SECS` (default: 30)
#[derive(Clone)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub token: Option<String>,
    pub dimensions: usize,
    pub timeout: Duration,
}

impl EmbeddingConfig {
    /// Config for the default model against a custom endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Full URL of the feature-extraction pipeline for the configured model
    pub fn feature_extraction_url(&self) -> String {
        format!(
            "{}/models/{}/pipeline/feature-extraction",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            token: None,
            dimensions: DEFAULT_DIMENSIONS,
            timeout: Duration::from_secs(30),
        }
    }
}

// Keeps the token out of logs.
impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("dimensions", &self.dimensions)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FromEnv for EmbeddingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let dimensions = env_parse_or("HF_EMBEDDING_DIMENSIONS", DEFAULT_DIMENSIONS)?;
        if dimensions == 0 {
            return Err(ConfigError::Invalid(
                "HF_EMBEDDING_DIMENSIONS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            endpoint: env_or_default("HF_ENDPOINT", DEFAULT_ENDPOINT),
            model: env_or_default("HF_MODEL", DEFAULT_MODEL),
            token: env_optional("HF_TOKEN"),
            dimensions,
            timeout: Duration::from_secs(env_parse_or("HF_TIMEOUT_SECS", 30u64)?),
        })
    }
}
