//! Error types for the data-loader crate.

use thiserror::Error;

use crate::types::MovieId;

/// Errors that can occur while reading or writing movie documents
#[derive(Error, Debug)]
pub enum StoreError {
    /// The deployment could not be reached or rejected the credentials
    #[error("Failed to connect to document store: {0}")]
    Connection(String),

    /// Any driver error raised by a command or a cursor
    #[error("Document store error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// No vector search index with this name covers the requested field
    #[error("Vector index '{index}' not found for field '{path}'")]
    IndexNotFound { index: String, path: String },

    /// A document or vector did not have the expected shape
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A search request was rejected before reaching the store
    #[error("Invalid search request: {0}")]
    InvalidQuery(String),

    /// An update targeted a document that does not exist
    #[error("Movie {0} not found")]
    MovieNotFound(MovieId),
}

impl StoreError {
    /// Whether the failure came from the network or the remote deployment
    pub fn is_remote(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Database(_))
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
