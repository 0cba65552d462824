//! Normalization of feature-extraction responses.
//!
//! Depending on the model and pipeline the service answers with a flat
//! vector, one vector wrapped in a batch, a matrix of per-token vectors, or
//! a batch of such matrices. Everything is reduced to a single `Vec<f32>`.

use serde::Deserialize;

use crate::{MLClientError, Result};

/// Raw response body of the feature-extraction pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeatureExtractionResponse {
    /// `[f32; D]` - sentence embedding
    Flat(Vec<f32>),
    /// `[[f32; D]; N]` - a batch of one, or per-token embeddings
    Nested(Vec<Vec<f32>>),
    /// `[[[f32; D]; N]; B]` - batch of per-token embeddings
    Batched(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtractionResponse {
    /// Reduce the response to one embedding vector.
    ///
    /// Single-row matrices are unwrapped; multi-row matrices are mean-pooled
    /// over their rows. Only the first entry of a batch is used.
    pub fn into_embedding(self) -> Result<Vec<f32>> {
        match self {
            FeatureExtractionResponse::Flat(vector) => Ok(vector),
            FeatureExtractionResponse::Nested(rows) => mean_pool(rows),
            FeatureExtractionResponse::Batched(batch) => {
                let rows = batch.into_iter().next().ok_or_else(|| {
                    MLClientError::InvalidResponse("empty batch in response".to_string())
                })?;
                mean_pool(rows)
            }
        }
    }
}

/// Average a matrix of row vectors into one vector
pub fn mean_pool(mut rows: Vec<Vec<f32>>) -> Result<Vec<f32>> {
    match rows.len() {
        0 => Err(MLClientError::InvalidResponse(
            "response contained no vectors".to_string(),
        )),
        1 => Ok(rows.swap_remove(0)),
        n => {
            let width = rows[0].len();
            let mut pooled = vec![0.0f32; width];
            for (i, row) in rows.iter().enumerate() {
                if row.len() != width {
                    return Err(MLClientError::InvalidResponse(format!(
                        "ragged response: row {} has {} values, expected {}",
                        i,
                        row.len(),
                        width
                    )));
                }
                for (acc, value) in pooled.iter_mut().zip(row) {
                    *acc += value;
                }
            }
            let count = n as f32;
            pooled.iter_mut().for_each(|v| *v /= count);
            Ok(pooled)
        }
    }
}
