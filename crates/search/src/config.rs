//! Search parameters.

use data_loader::{DEFAULT_LIMIT, DEFAULT_NUM_CANDIDATES, validate_bounds};
use settings::{ConfigError, FromEnv, env_or_default, env_parse_or};

/// Name of the pre-built vector index on the movie collection
pub const DEFAULT_INDEX: &str = "PlotSemanticSearch";

/// Field holding each movie's plot embedding
pub const DEFAULT_EMBEDDING_PATH: &str = "plot_embedding_hf";

/// Fixed parameters of every vector search request.
///
/// Environment variables:
/// - `SEARCH_INDEX` (default: PlotSemanticSearch)
/// - `SEARCH_EMBEDDING_PATH` (default: plot_embedding_hf)
/// - `SEARCH_NUM_CANDIDATES` (default: 100)
/// - `SEARCH_LIMIT` (default: 4)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub index: String,
    pub path: String,
    pub num_candidates: u32,
    pub limit: u32,
}

impl SearchConfig {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_num_candidates(mut self, num_candidates: u32) -> Self {
        self.num_candidates = num_candidates;
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Check that the parameters form a request the store will accept
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.trim().is_empty() || self.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "search index and embedding path must not be empty".to_string(),
            ));
        }
        validate_bounds(self.num_candidates, self.limit).map_err(ConfigError::Invalid)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            path: DEFAULT_EMBEDDING_PATH.to_string(),
            num_candidates: DEFAULT_NUM_CANDIDATES,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FromEnv for SearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            index: env_or_default("SEARCH_INDEX", DEFAULT_INDEX),
            path: env_or_default("SEARCH_EMBEDDING_PATH", DEFAULT_EMBEDDING_PATH),
            num_candidates: env_parse_or("SEARCH_NUM_CANDIDATES", DEFAULT_NUM_CANDIDATES)?,
            limit: env_parse_or("SEARCH_LIMIT", DEFAULT_LIMIT)?,
        };
        config.validate()?;
        Ok(config)
    }
}
