//! Embedding client for the hosted feature-extraction model.
//!
//! This crate turns free text into a fixed-length `Vec<f32>` by calling a
//! remote inference service. It handles:
//! - Building the HTTP client from [`EmbeddingConfig`]
//! - Sending the text to the feature-extraction pipeline
//! - Normalizing the several response shapes into one flat vector
//! - Mapping transport and HTTP failures into [`MLClientError`]
//!
//! There is no retry policy and no caching: every call is one request and
//! the caller sees failures directly.

pub mod config;
pub mod huggingface;
pub mod response;

use async_trait::async_trait;
use thiserror::Error;

pub use config::EmbeddingConfig;
pub use huggingface::HuggingFaceEmbedder;
pub use response::FeatureExtractionResponse;

/// Errors that can occur when talking to the embedding service
#[derive(Error, Debug)]
pub enum MLClientError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Failed to reach embedding service: {0}")]
    ConnectionError(String),

    #[error("Embedding service rejected the access token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Embedding service rate limit exceeded")]
    RateLimited,

    #[error("Embedding service returned HTTP {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("Invalid response from embedding service: {0}")]
    InvalidResponse(String),
}

impl MLClientError {
    /// Whether the failure came from the remote service or the network,
    /// as opposed to a malformed payload or local setup problem.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            MLClientError::ConnectionError(_)
                | MLClientError::Unauthorized { .. }
                | MLClientError::RateLimited
                | MLClientError::ServiceError { .. }
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, MLClientError>;

/// Produces a fixed-length embedding for a piece of text.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn Embedder>` by the search orchestrator and the backfill job.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text. The returned vector has exactly
    /// [`Embedder::dimensions`] elements.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimensionality of the model.
    fn dimensions(&self) -> usize;

    /// Model identifier sent to the service.
    fn model(&self) -> &str;
}
