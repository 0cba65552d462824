//! Semantic movie search.
//!
//! This crate contains the orchestrator that turns a free-text query into a
//! vector search against the movie collection.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use orchestrator::{SearchOrchestrator, SearchResults};
