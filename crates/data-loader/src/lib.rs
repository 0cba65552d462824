//! # Data Loader Crate
//!
//! This crate loads movie documents from the document database and runs
//! vector searches against the store's pre-built vector index.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, MovieId, PendingMovie, VectorIndex)
//! - **query**: `$vectorSearch` request and its aggregation pipeline
//! - **store**: The `MovieStore` trait consumed by search and backfill
//! - **mongo**: `MongoMovieStore`, the MongoDB implementation
//! - **config**: Connection settings loaded from the environment
//! - **error**: Error types for store access
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{MongoConfig, MongoMovieStore, MovieStore, VectorSearchRequest};
//! use futures::TryStreamExt;
//!
//! let store = MongoMovieStore::connect(&MongoConfig::new(url)).await?;
//! let request = VectorSearchRequest::new("PlotSemanticSearch", "plot_embedding_hf", embedding);
//! let movies: Vec<_> = store.vector_search(&request).await?.try_collect().await?;
//! ```

pub mod config;
pub mod error;
pub mod mongo;
pub mod query;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use config::MongoConfig;
pub use error::{Result, StoreError};
pub use mongo::MongoMovieStore;
pub use query::{
    DEFAULT_LIMIT, DEFAULT_NUM_CANDIDATES, MAX_NUM_CANDIDATES, VectorSearchRequest,
    validate_bounds,
};
pub use store::{MovieStore, MovieStream};
pub use types::{Movie, MovieId, PendingMovie, VectorIndex};
