use std::time::Duration;

use settings::{ConfigError, FromEnv, env_or_default, env_parse_or};

/// Settings of one backfill run.
///
/// Environment variables:
/// - `SEARCH_EMBEDDING_PATH` (default: plot_embedding_hf) - shared with search
/// - `BACKFILL_LIMIT` (default: 50)
/// - `BACKFILL_DELAY_MS` (default: 500) - pause between documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    pub path: String,
    pub limit: u32,
    pub delay: Duration,
    pub fail_fast: bool,
}

impl BackfillConfig {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Check the settings before any document is selected.
    ///
    /// A zero limit would reach the store as "no limit" and select the
    /// whole collection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::Invalid(
                "backfill limit must be at least 1".to_string(),
            ));
        }
        if self.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "embedding path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            path: "plot_embedding_hf".to_string(),
            limit: 50,
            delay: Duration::from_millis(500),
            fail_fast: false,
        }
    }
}

impl FromEnv for BackfillConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            path: env_or_default("SEARCH_EMBEDDING_PATH", "plot_embedding_hf"),
            limit: env_parse_or("BACKFILL_LIMIT", 50u32)?,
            delay: Duration::from_millis(env_parse_or("BACKFILL_DELAY_MS", 500u64)?),
            fail_fast: false,
        };
        config.validate()?;
        Ok(config)
    }
}
