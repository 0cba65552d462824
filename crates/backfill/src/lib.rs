//! Offline embedding backfill for the movie collection.
//!
//! This crate provides:
//! - BackfillJob, which embeds the plots of movies that have no embedding yet
//! - BackfillReport, the per-run accounting of successes and failures
//! - BackfillConfig, loaded from the environment
//!
//! ## Architecture
//! The job runs in three stages:
//! 1. Ask the store for movies with a plot but no embedding
//! 2. For each one, embed the plot and write the vector back
//! 3. Record every per-document failure and keep going (unless fail-fast)
//!
//! ## Example Usage
//! ```ignore
//! use backfill::{BackfillConfig, BackfillJob};
//!
//! let job = BackfillJob::new(embedder.clone(), store.clone(), BackfillConfig::default());
//! let report = job.run().await?;
//! println!("{}", report);
//! ```

pub mod config;
pub mod job;
pub mod report;

// Re-export main types
pub use config::BackfillConfig;
pub use job::{BackfillError, BackfillJob, DocumentError};
pub use report::{BackfillFailure, BackfillReport};
