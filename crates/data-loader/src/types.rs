//! Core domain types for movie documents and vector indexes.

use mongodb::bson::{self, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Opaque document key of a movie (`_id`)
pub type MovieId = bson::oid::ObjectId;

/// A movie document as read from the collection.
///
/// The embedding field is never decoded here: search results project it out
/// and the backfill only needs the plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: MovieId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Similarity reported by the store; only set on search results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Movie {
    /// Decode a raw document, reporting which document failed on mismatch
    pub fn from_document(document: Document) -> Result<Self> {
        let key = document_key(&document);
        bson::from_document(document).map_err(|e| {
            StoreError::SchemaMismatch(format!("document {} is not a movie: {}", key, e))
        })
    }
}

/// A document selected for embedding.
///
/// Documents that match the pending filter but do not decode as a [`Movie`]
/// are kept as `Undecodable` so the caller can account for them.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMovie {
    Ready(Movie),
    Undecodable {
        /// Printable `_id` of the document
        key: String,
        title: Option<String>,
        reason: String,
    },
}

impl PendingMovie {
    pub fn from_document(document: Document) -> Self {
        let key = document_key(&document);
        let title = document.get_str("title").ok().map(str::to_string);
        match Movie::from_document(document) {
            Ok(movie) => PendingMovie::Ready(movie),
            Err(e) => PendingMovie::Undecodable {
                key,
                title,
                reason: e.to_string(),
            },
        }
    }
}

fn document_key(document: &Document) -> String {
    match document.get("_id") {
        Some(Bson::ObjectId(id)) => id.to_hex(),
        Some(other) => other.to_string(),
        None => "<no _id>".to_string(),
    }
}

/// Description of a vector search index on the movie collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorIndex {
    pub name: String,
    pub path: String,
    /// Declared vector length, when the definition states one
    pub num_dimensions: Option<usize>,
    pub similarity: Option<String>,
    pub queryable: bool,
}

impl VectorIndex {
    /// Extract the definition for `path` from one entry of the search index listing.
    ///
    /// Understands both the `vectorSearch` index type
    /// (`latestDefinition.fields[] { type: "vector", path, numDimensions }`)
    /// and the older `knnVector` mapping
    /// (`latestDefinition.mappings.fields.<path> { type: "knnVector", dimensions }`).
    /// Returns `None` when the index does not cover `path`.
    pub fn from_search_index(entry: &Document, path: &str) -> Option<Self> {
        let name = entry.get_str("name").ok()?.to_string();
        let definition = entry
            .get_document("latestDefinition")
            .or_else(|_| entry.get_document("definition"))
            .ok()?;
        // Missing means an older server that does not report it.
        let queryable = entry.get_bool("queryable").unwrap_or(true);

        if let Ok(fields) = definition.get_array("fields") {
            for field in fields.iter().filter_map(Bson::as_document) {
                if field.get_str("type").ok() == Some("vector")
                    && field.get_str("path").ok() == Some(path)
                {
                    return Some(Self {
                        name,
                        path: path.to_string(),
                        num_dimensions: field.get("numDimensions").and_then(as_usize),
                        similarity: field.get_str("similarity").ok().map(str::to_string),
                        queryable,
                    });
                }
            }
        }

        let mapped = definition
            .get_document("mappings")
            .and_then(|m| m.get_document("fields"))
            .and_then(|f| f.get_document(path))
            .ok()?;
        if mapped.get_str("type").ok() != Some("knnVector") {
            return None;
        }
        Some(Self {
            name,
            path: path.to_string(),
            num_dimensions: mapped.get("dimensions").and_then(as_usize),
            similarity: mapped.get_str("similarity").ok().map(str::to_string),
            queryable,
        })
    }
}

fn as_usize(value: &Bson) -> Option<usize> {
    match value {
        Bson::Int32(v) => usize::try_from(*v).ok(),
        Bson::Int64(v) => usize::try_from(*v).ok(),
        Bson::Double(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
        _ => None,
    }
}

/// Convert an embedding into the BSON array stored on a document
pub fn embedding_to_bson(embedding: &[f32]) -> Bson {
    Bson::Array(embedding.iter().map(|v| Bson::Double(f64::from(*v))).collect())
}
