//! The document store seam used by search and backfill.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::query::VectorSearchRequest;
use crate::types::{Movie, MovieId, PendingMovie, VectorIndex};

/// Lazy, finite, non-restartable sequence of search hits in rank order
pub type MovieStream = BoxStream<'static, Result<Movie>>;

/// Read and write access to the movie collection.
///
/// ## Design Note
/// - `Send + Sync` so one store can be shared as `Arc<dyn MovieStore>`
/// - Similarity ranking is entirely the store's job; implementations only
///   forward [`VectorSearchRequest`]s
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Look up the vector index named `index` and its definition for `path`.
    ///
    /// Fails with `IndexNotFound` when no such index covers `path`.
    async fn describe_vector_index(&self, index: &str, path: &str) -> Result<VectorIndex>;

    /// Run a vector search. Documents lacking the embedding are never returned.
    async fn vector_search(&self, request: &VectorSearchRequest) -> Result<MovieStream>;

    /// Up to `limit` documents that have a plot but no embedding at `path`.
    ///
    /// Documents that do not decode as a movie are returned as
    /// [`PendingMovie::Undecodable`] rather than dropped.
    async fn pending_embeddings(&self, path: &str, limit: i64) -> Result<Vec<PendingMovie>>;

    /// Write `embedding` to `path` on the movie with key `id`
    async fn store_embedding(&self, id: &MovieId, path: &str, embedding: &[f32]) -> Result<()>;

    /// Total number of movie documents
    async fn count_movies(&self) -> Result<u64>;

    /// Number of movie documents carrying an embedding at `path`
    async fn count_embedded(&self, path: &str) -> Result<u64>;
}
