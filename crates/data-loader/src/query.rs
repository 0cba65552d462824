//! Vector search request and its aggregation pipeline.

use mongodb::bson::{Document, doc};

use crate::error::{Result, StoreError};
use crate::types::embedding_to_bson;

/// Candidates examined by the approximate search before ranking
pub const DEFAULT_NUM_CANDIDATES: u32 = 100;

/// Documents returned per query
pub const DEFAULT_LIMIT: u32 = 4;

/// Upper bound the store accepts for `numCandidates`
pub const MAX_NUM_CANDIDATES: u32 = 10_000;

/// One `$vectorSearch` query against a named index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchRequest {
    pub index: String,
    pub path: String,
    pub query_vector: Vec<f32>,
    pub num_candidates: u32,
    pub limit: u32,
}

impl VectorSearchRequest {
    pub fn new(index: impl Into<String>, path: impl Into<String>, query_vector: Vec<f32>) -> Self {
        Self {
            index: index.into(),
            path: path.into(),
            query_vector,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_num_candidates(mut self, num_candidates: u32) -> Self {
        self.num_candidates = num_candidates;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Reject requests the store would refuse or answer meaninglessly
    pub fn validate(&self) -> Result<()> {
        if self.query_vector.is_empty() {
            return Err(StoreError::InvalidQuery("query vector is empty".to_string()));
        }
        validate_bounds(self.num_candidates, self.limit).map_err(StoreError::InvalidQuery)
    }

    /// Aggregation pipeline for this request.
    ///
    /// The stored embedding is dropped from the output and the similarity
    /// is exposed as `score`.
    pub fn pipeline(&self) -> Vec<Document> {
        vec![
            doc! {
                "$vectorSearch": {
                    "index": self.index.as_str(),
                    "path": self.path.as_str(),
                    "queryVector": embedding_to_bson(&self.query_vector),
                    "numCandidates": i64::from(self.num_candidates),
                    "limit": i64::from(self.limit),
                }
            },
            doc! { "$set": { "score": { "$meta": "vectorSearchScore" } } },
            doc! { "$unset": self.path.as_str() },
        ]
    }
}

/// Check `limit` and `numCandidates` against each other and the store's cap
pub fn validate_bounds(num_candidates: u32, limit: u32) -> std::result::Result<(), String> {
    if limit == 0 {
        return Err("limit must be at least 1".to_string());
    }
    if num_candidates < limit {
        return Err(format!(
            "numCandidates ({}) must be at least limit ({})",
            num_candidates, limit
        ));
    }
    if num_candidates > MAX_NUM_CANDIDATES {
        return Err(format!(
            "numCandidates ({}) exceeds the maximum of {}",
            num_candidates, MAX_NUM_CANDIDATES
        ));
    }
    Ok(())
}
