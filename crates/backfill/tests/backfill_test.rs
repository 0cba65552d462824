//! Integration tests for the backfill job.
//!
//! These tests run the job against an in-memory store and an embedder that
//! can be told to fail on specific plots.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backfill::{BackfillConfig, BackfillError, BackfillJob};
use data_loader::{
    Movie, MovieId, MovieStore, MovieStream, PendingMovie, StoreError, VectorIndex,
    VectorSearchRequest,
};
use ml_client::{Embedder, MLClientError};
use tokio::sync::Mutex;

const DIMENSIONS: usize = 384;

struct ScriptedEmbedder {
    fail_on: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEmbedder {
    fn new(fail_on: &[&str]) -> Self {
        Self {
            fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> ml_client::Result<Vec<f32>> {
        self.calls.lock().await.push(text.to_string());
        if self.fail_on.contains(text) {
            return Err(MLClientError::RateLimited);
        }
        Ok(vec![text.len() as f32; DIMENSIONS])
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct MemoryStore {
    movies: Mutex<Vec<(Movie, Option<Vec<f32>>)>>,
    /// Documents that match the pending filter but are not movies
    broken: Mutex<Vec<PendingMovie>>,
    limits_seen: Mutex<Vec<i64>>,
    fail_listing: bool,
}

impl MemoryStore {
    async fn add(&self, title: &str, plot: Option<&str>) -> MovieId {
        let id = MovieId::new();
        self.movies.lock().await.push((
            Movie {
                id,
                title: title.to_string(),
                plot: plot.map(str::to_string),
                genres: Vec::new(),
                score: None,
            },
            None,
        ));
        id
    }

    async fn add_broken(&self, key: &str, reason: &str) {
        self.broken.lock().await.push(PendingMovie::Undecodable {
            key: key.to_string(),
            title: None,
            reason: reason.to_string(),
        });
    }

    async fn embedding_of(&self, id: MovieId) -> Option<Vec<f32>> {
        self.movies
            .lock()
            .await
            .iter()
            .find(|(m, _)| m.id == id)
            .and_then(|(_, e)| e.clone())
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn describe_vector_index(
        &self,
        index: &str,
        path: &str,
    ) -> data_loader::Result<VectorIndex> {
        Err(StoreError::IndexNotFound {
            index: index.to_string(),
            path: path.to_string(),
        })
    }

    async fn vector_search(
        &self,
        _request: &VectorSearchRequest,
    ) -> data_loader::Result<MovieStream> {
        Err(StoreError::InvalidQuery("not supported".to_string()))
    }

    async fn pending_embeddings(
        &self,
        _path: &str,
        limit: i64,
    ) -> data_loader::Result<Vec<PendingMovie>> {
        self.limits_seen.lock().await.push(limit);
        if self.fail_listing {
            return Err(StoreError::Connection("server selection timeout".to_string()));
        }
        let broken = self.broken.lock().await.clone();
        let ready: Vec<PendingMovie> = self
            .movies
            .lock()
            .await
            .iter()
            .filter(|(_, e)| e.is_none())
            .map(|(m, _)| PendingMovie::Ready(m.clone()))
            .collect();
        Ok(broken.into_iter().chain(ready).take(limit as usize).collect())
    }

    async fn store_embedding(
        &self,
        id: &MovieId,
        _path: &str,
        embedding: &[f32],
    ) -> data_loader::Result<()> {
        let mut movies = self.movies.lock().await;
        let entry = movies
            .iter_mut()
            .find(|(m, _)| m.id == *id)
            .ok_or(StoreError::MovieNotFound(*id))?;
        entry.1 = Some(embedding.to_vec());
        Ok(())
    }

    async fn count_movies(&self) -> data_loader::Result<u64> {
        Ok(self.movies.lock().await.len() as u64)
    }

    async fn count_embedded(&self, _path: &str) -> data_loader::Result<u64> {
        Ok(self.movies.lock().await.iter().filter(|(_, e)| e.is_some()).count() as u64)
    }
}

fn new_job(
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn MovieStore>,
    config: BackfillConfig,
) -> BackfillJob {
    BackfillJob::new(embedder, store, config).expect("valid backfill config")
}

fn config() -> BackfillConfig {
    BackfillConfig::default().with_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_embeds_every_pending_movie() {
    let store = Arc::new(MemoryStore::default());
    let first = store.add("The Great Train Robbery", Some("A group of bandits stage a brazen train hold-up.")).await;
    let second = store.add("A Corner in Wheat", Some("A greedy tycoon decides to corner the market.")).await;

    let job = new_job(Arc::new(ScriptedEmbedder::new(&[])), store.clone(), config());
    let report = job.run().await.expect("backfill failed");

    assert_eq!(report.pending, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.embedded, 2);
    assert!(!report.has_failures());
    assert_eq!(store.embedding_of(first).await.unwrap().len(), DIMENSIONS);
    assert_eq!(store.embedding_of(second).await.unwrap().len(), DIMENSIONS);
    assert_eq!(store.count_embedded("plot_embedding_hf").await.unwrap(), 2);
}

#[tokio::test]
async fn test_failures_are_reported_and_run_continues() {
    let store = Arc::new(MemoryStore::default());
    store.add("Good One", Some("first plot")).await;
    let bad = store.add("Rate Limited", Some("second plot")).await;
    let last = store.add("Good Two", Some("third plot")).await;

    let job = new_job(
        Arc::new(ScriptedEmbedder::new(&["second plot"])),
        store.clone(),
        config(),
    );
    let report = job.run().await.expect("backfill failed");

    assert_eq!(report.embedded, 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.stopped_early);
    assert_eq!(report.failures[0].key, bad.to_hex());
    assert_eq!(report.failures[0].title, "Rate Limited");
    assert!(report.failures[0].reason.contains("rate limit"));
    assert!(store.embedding_of(bad).await.is_none());
    assert!(store.embedding_of(last).await.is_some());
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let store = Arc::new(MemoryStore::default());
    store.add("Broken", Some("boom")).await;
    let untouched = store.add("Never Reached", Some("fine plot")).await;

    let embedder = Arc::new(ScriptedEmbedder::new(&["boom"]));
    let job = new_job(embedder.clone(), store.clone(), config().with_fail_fast(true));
    let report = job.run().await.expect("backfill failed");

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed(), 1);
    assert!(report.stopped_early);
    assert_eq!(report.skipped(), 1);
    assert_eq!(embedder.calls.lock().await.len(), 1);
    assert!(store.embedding_of(untouched).await.is_none());
}

#[tokio::test]
async fn test_movie_without_plot_is_a_failure_not_a_call() {
    let store = Arc::new(MemoryStore::default());
    store.add("Blank", Some("   ")).await;
    store.add("Missing", None).await;

    let embedder = Arc::new(ScriptedEmbedder::new(&[]));
    let job = new_job(embedder.clone(), store, config());
    let report = job.run().await.expect("backfill failed");

    assert_eq!(report.failed(), 2);
    assert!(report.failures.iter().all(|f| f.reason.contains("no plot")));
    assert!(embedder.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_limit_bounds_the_batch() {
    let store = Arc::new(MemoryStore::default());
    for i in 0..5 {
        store.add(&format!("Movie {}", i), Some(&format!("plot number {}", i))).await;
    }

    let job = new_job(
        Arc::new(ScriptedEmbedder::new(&[])),
        store.clone(),
        config().with_limit(3),
    );
    let report = job.run().await.expect("backfill failed");

    assert_eq!(report.pending, 3);
    assert_eq!(store.count_embedded("plot_embedding_hf").await.unwrap(), 3);

    // A second run picks up only what is left.
    let report = job.run().await.expect("backfill failed");
    assert_eq!(report.pending, 2);
    assert_eq!(store.count_embedded("plot_embedding_hf").await.unwrap(), 5);
}

#[tokio::test]
async fn test_listing_failure_aborts_the_job() {
    let store = Arc::new(MemoryStore {
        fail_listing: true,
        ..MemoryStore::default()
    });

    let job = new_job(Arc::new(ScriptedEmbedder::new(&[])), store, config());
    let err = job.run().await.unwrap_err();
    assert!(matches!(err, BackfillError::ListPending(StoreError::Connection(_))));
}

#[tokio::test]
async fn test_delay_between_documents() {
    let store = Arc::new(MemoryStore::default());
    store.add("One", Some("one")).await;
    store.add("Two", Some("two")).await;
    store.add("Three", Some("three")).await;

    let job = new_job(
        Arc::new(ScriptedEmbedder::new(&[])),
        store,
        BackfillConfig::default().with_delay(Duration::from_millis(20)),
    );
    let report = job.run().await.expect("backfill failed");

    assert_eq!(report.embedded, 3);
    assert!(report.elapsed >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_nothing_pending_is_an_empty_report() {
    let job = new_job(
        Arc::new(ScriptedEmbedder::new(&[])),
        Arc::new(MemoryStore::default()),
        config(),
    );
    let report = job.run().await.expect("backfill failed");
    assert_eq!(report.pending, 0);
    assert_eq!(report.processed, 0);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_zero_limit_is_rejected_before_listing() {
    let store = Arc::new(MemoryStore::default());
    store.add("Any", Some("any plot")).await;

    let result = BackfillJob::new(
        Arc::new(ScriptedEmbedder::new(&[])),
        store.clone(),
        config().with_limit(0),
    );
    assert!(matches!(result, Err(BackfillError::InvalidConfig(_))));
    assert!(store.limits_seen.lock().await.is_empty());
}

#[tokio::test]
async fn test_configured_limit_reaches_the_store() {
    let store = Arc::new(MemoryStore::default());
    let job = new_job(
        Arc::new(ScriptedEmbedder::new(&[])),
        store.clone(),
        config().with_limit(7),
    );
    job.run().await.expect("backfill failed");
    assert_eq!(*store.limits_seen.lock().await, vec![7]);
}

#[tokio::test]
async fn test_undecodable_document_is_reported() {
    let store = Arc::new(MemoryStore::default());
    store
        .add_broken("573a1390f29313caabcd4135", "document is not a movie: missing field `title`")
        .await;
    let good = store.add("Nosferatu", Some("A vampire takes interest in a new home.")).await;

    let embedder = Arc::new(ScriptedEmbedder::new(&[]));
    let job = new_job(embedder.clone(), store.clone(), config());
    let report = job.run().await.expect("backfill failed");

    assert_eq!(report.pending, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.embedded, 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].key, "573a1390f29313caabcd4135");
    assert_eq!(report.failures[0].title, "Unknown");
    assert!(report.failures[0].reason.contains("cannot be decoded"));
    assert_eq!(embedder.calls.lock().await.len(), 1);
    assert!(store.embedding_of(good).await.is_some());
}

#[tokio::test]
async fn test_undecodable_document_stops_fail_fast_run() {
    let store = Arc::new(MemoryStore::default());
    store.add_broken("573a1390f29313caabcd4135", "missing field `title`").await;
    store.add("Nosferatu", Some("A vampire takes interest in a new home.")).await;

    let embedder = Arc::new(ScriptedEmbedder::new(&[]));
    let job = new_job(embedder.clone(), store, config().with_fail_fast(true));
    let report = job.run().await.expect("backfill failed");

    assert!(report.stopped_early);
    assert_eq!(report.skipped(), 1);
    assert!(embedder.calls.lock().await.is_empty());
}
