//! Hugging Face feature-extraction client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::EmbeddingConfig;
use crate::response::FeatureExtractionResponse;
use crate::{Embedder, MLClientError, Result};

/// Longest error body kept in [`MLClientError::ServiceError`]
const MAX_ERROR_BODY: usize = 512;

/// Client for a hosted sentence-embedding model.
///
/// Receives its HTTP client by constructor injection so tests and callers
/// can share or customize it.
pub struct HuggingFaceEmbedder {
    http_client: Client,
    config: EmbeddingConfig,
    url: String,
}

impl HuggingFaceEmbedder {
    /// Build an embedder with its own HTTP client using the configured timeout.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MLClientError::ClientBuild(e.to_string()))?;
        Ok(Self::with_client(config, http_client))
    }

    /// Build an embedder around an existing HTTP client.
    pub fn with_client(config: EmbeddingConfig, http_client: Client) -> Self {
        if config.token.is_none() {
            warn!("No access token configured for the embedding service; requests are anonymous");
        }
        let url = config.feature_extraction_url();
        info!("Using embedding model {} at {}", config.model, url);
        Self {
            http_client,
            config,
            url,
        }
    }

    async fn request(&self, text: &str) -> Result<FeatureExtractionResponse> {
        let mut request = self
            .http_client
            .post(&self.url)
            .json(&json!({ "inputs": text }));
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Embedding request failed: {}", e);
            MLClientError::ConnectionError(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MLClientError::ConnectionError(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            MLClientError::InvalidResponse(format!("unexpected response body: {}", e))
        })
    }
}

fn status_error(status: StatusCode, body: String) -> MLClientError {
    error!("Embedding service returned {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MLClientError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => MLClientError::RateLimited,
        _ => {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            MLClientError::ServiceError {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Embedding {} characters with {}", text.len(), self.config.model);
        let embedding = self.request(text).await?.into_embedding()?;

        if embedding.len() != self.config.dimensions {
            error!(
                "Mismatch in embedding size: expected {}, got {}",
                self.config.dimensions,
                embedding.len()
            );
            return Err(MLClientError::InvalidResponse(format!(
                "expected {} dimensions, got {}",
                self.config.dimensions,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
