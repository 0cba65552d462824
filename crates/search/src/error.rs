//! Errors surfaced by the search orchestrator.

use data_loader::StoreError;
use ml_client::MLClientError;
use thiserror::Error;

/// Failures of a semantic search.
///
/// An empty result set is not an error: it comes back as `Ok` with no items.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The embedding service or the document store could not be reached,
    /// rejected the credentials, or failed the call
    #[error("Remote service error ({service}): {message}")]
    RemoteService {
        service: &'static str,
        message: String,
    },

    /// The named vector index does not exist on the target field
    #[error("Vector index '{index}' does not exist on field '{path}'")]
    IndexNotFound { index: String, path: String },

    /// The query vector or a returned document does not fit the stored schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Search parameters are out of range
    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),
}

impl From<MLClientError> for SearchError {
    fn from(err: MLClientError) -> Self {
        match err {
            MLClientError::InvalidResponse(message) => SearchError::SchemaMismatch(format!(
                "embedding service returned an unusable vector: {}",
                message
            )),
            other => SearchError::RemoteService {
                service: "embedding",
                message: other.to_string(),
            },
        }
    }
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IndexNotFound { index, path } => SearchError::IndexNotFound { index, path },
            StoreError::SchemaMismatch(message) => SearchError::SchemaMismatch(message),
            StoreError::InvalidQuery(message) => SearchError::InvalidConfig(message),
            other => SearchError::RemoteService {
                service: "document store",
                message: other.to_string(),
            },
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SearchError>;
