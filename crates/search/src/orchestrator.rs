//! # Search Orchestrator
//!
//! This module coordinates one semantic search:
//! 1. Verify the vector index exists on the embedding field
//! 2. Embed the query text
//! 3. Check the query vector against the index's dimensionality
//! 4. Submit the `$vectorSearch` request
//! 5. Hand back a lazy, bounded stream of matching movies
//!
//! The embedder and the store are injected, so tests run the whole flow
//! against in-memory fakes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use data_loader::{Movie, MovieStore, VectorIndex, VectorSearchRequest};
use ml_client::Embedder;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};

/// Ranked matches of one query, produced lazily from the store's cursor.
///
/// The sequence is finite, capped at the configured limit, and can only be
/// consumed once. Zero items is a valid outcome.
pub struct SearchResults {
    query: String,
    stream: BoxStream<'static, Result<Movie>>,
}

impl SearchResults {
    /// The query text these results answer
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Drain the remaining matches into a vector
    pub async fn into_vec(self) -> Result<Vec<Movie>> {
        self.stream.try_collect().await
    }
}

impl Stream for SearchResults {
    type Item = Result<Movie>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.poll_next_unpin(cx)
    }
}

/// Runs semantic searches over the movie collection
#[derive(Clone)]
pub struct SearchOrchestrator {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn MovieStore>,
    config: SearchConfig,
}

impl SearchOrchestrator {
    /// Create an orchestrator from explicitly constructed clients.
    ///
    /// Fails with `InvalidConfig` when the search parameters are out of range.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn MovieStore>,
        config: SearchConfig,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            embedder,
            store,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Main entry point: search for movies whose plots match `query`
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let start_time = Instant::now();
        if query.trim().is_empty() {
            warn!("Searching with an empty query; results will not be meaningful");
        }
        info!("Searching for: {:?}", query);

        let index = self.verify_index().await?;

        let query_vector = self.embed_query(query).await?;
        if let Some(expected) = index.num_dimensions {
            if query_vector.len() != expected {
                return Err(SearchError::SchemaMismatch(format!(
                    "query embedding has {} dimensions but index '{}' expects {}",
                    query_vector.len(),
                    index.name,
                    expected
                )));
            }
        }

        let request = self.build_request(query_vector);
        let limit = request.limit as usize;
        let stream = self
            .store
            .vector_search(&request)
            .await?
            .map_err(SearchError::from)
            .take(limit)
            .boxed();

        info!(
            "Vector search submitted in {:.2?} (numCandidates: {}, limit: {})",
            start_time.elapsed(),
            request.num_candidates,
            request.limit
        );
        Ok(SearchResults {
            query: query.to_string(),
            stream,
        })
    }

    /// Search and collect every match
    pub async fn search_all(&self, query: &str) -> Result<Vec<Movie>> {
        let movies = self.search(query).await?.into_vec().await?;
        info!("Found {} matches for {:?}", movies.len(), query);
        Ok(movies)
    }

    /// Embed the query text via the embedding service
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let start_time = Instant::now();
        let embedding = self.embedder.embed(query).await?;
        debug!(
            "Embedded query with {} ({} dimensions) in {:.2?}",
            self.embedder.model(),
            embedding.len(),
            start_time.elapsed()
        );
        Ok(embedding)
    }

    /// Make sure the configured index covers the embedding field and agrees
    /// with the embedder on dimensionality.
    pub async fn verify_index(&self) -> Result<VectorIndex> {
        let index = self
            .store
            .describe_vector_index(&self.config.index, &self.config.path)
            .await?;

        if let Some(expected) = index.num_dimensions {
            if expected != self.embedder.dimensions() {
                return Err(SearchError::SchemaMismatch(format!(
                    "index '{}' stores {}-dimensional vectors but model {} produces {}",
                    index.name,
                    expected,
                    self.embedder.model(),
                    self.embedder.dimensions()
                )));
            }
        }
        Ok(index)
    }

    fn build_request(&self, query_vector: Vec<f32>) -> VectorSearchRequest {
        VectorSearchRequest::new(&self.config.index, &self.config.path, query_vector)
            .with_num_candidates(self.config.num_candidates)
            .with_limit(self.config.limit)
    }
}
