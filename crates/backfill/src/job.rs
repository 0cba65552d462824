//! The backfill job.

use std::sync::Arc;
use std::time::Instant;

use data_loader::{Movie, MovieStore, PendingMovie, StoreError};
use ml_client::{Embedder, MLClientError};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BackfillConfig;
use crate::report::{BackfillFailure, BackfillReport};

/// Failure that aborts the whole run
#[derive(Error, Debug)]
pub enum BackfillError {
    #[error("Invalid backfill configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to list movies without embeddings: {0}")]
    ListPending(#[source] StoreError),
}

/// Failure of a single document; recorded in the report
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("movie has no plot to embed")]
    MissingPlot,

    #[error("document cannot be decoded: {0}")]
    Undecodable(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] MLClientError),

    #[error("write failed: {0}")]
    Store(#[from] StoreError),
}

/// Embeds plots of movies that lack an embedding and stores the vectors.
///
/// Runs sequentially, one document at a time, pausing between documents to
/// stay under the inference service's rate limit.
pub struct BackfillJob {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn MovieStore>,
    config: BackfillConfig,
}

impl BackfillJob {
    /// Create a job from explicitly constructed clients.
    ///
    /// Fails with `InvalidConfig` when the settings are out of range.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn MovieStore>,
        config: BackfillConfig,
    ) -> Result<Self, BackfillError> {
        config
            .validate()
            .map_err(|e| BackfillError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            embedder,
            store,
            config,
        })
    }

    /// Run the backfill and report what happened.
    ///
    /// Only failing to list the pending documents is an error; per-document
    /// failures end up in [`BackfillReport::failures`].
    pub async fn run(&self) -> Result<BackfillReport, BackfillError> {
        let start_time = Instant::now();
        let pending = self
            .store
            .pending_embeddings(&self.config.path, i64::from(self.config.limit))
            .await
            .map_err(BackfillError::ListPending)?;

        let total = pending.len();
        info!(
            "Generating embeddings for {} movies into '{}' with {}",
            total,
            self.config.path,
            self.embedder.model()
        );

        let mut report = BackfillReport {
            pending: total,
            ..BackfillReport::default()
        };

        for (i, entry) in pending.into_iter().enumerate() {
            let (key, title, outcome) = match entry {
                PendingMovie::Ready(movie) => {
                    if i > 0 && !self.config.delay.is_zero() {
                        tokio::time::sleep(self.config.delay).await;
                    }
                    let outcome = self.embed_movie(&movie).await;
                    (movie.id.to_hex(), movie.title, outcome)
                }
                PendingMovie::Undecodable { key, title, reason } => (
                    key,
                    title.unwrap_or_else(|| "Unknown".to_string()),
                    Err(DocumentError::Undecodable(reason)),
                ),
            };

            report.processed += 1;
            match outcome {
                Ok(()) => {
                    report.embedded += 1;
                    info!("[{}/{}] Generated embedding for: {}", i + 1, total, title);
                }
                Err(e) => {
                    warn!("[{}/{}] Error generating embedding for {}: {}", i + 1, total, title, e);
                    report.failures.push(BackfillFailure {
                        key,
                        title,
                        reason: e.to_string(),
                    });
                    if self.config.fail_fast {
                        report.stopped_early = i + 1 < total;
                        break;
                    }
                }
            }
        }

        report.elapsed = start_time.elapsed();
        info!("Backfill finished: {}", report);
        Ok(report)
    }

    async fn embed_movie(&self, movie: &Movie) -> Result<(), DocumentError> {
        let plot = movie
            .plot
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(DocumentError::MissingPlot)?;

        let embedding = self.embedder.embed(plot).await?;
        self.store
            .store_embedding(&movie.id, &self.config.path, &embedding)
            .await?;
        Ok(())
    }
}
