//! MongoDB implementation of [`MovieStore`].

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, Tls, TlsOptions};
use mongodb::{Client, Collection};
use tracing::{debug, info, instrument, warn};

use crate::config::MongoConfig;
use crate::error::{Result, StoreError};
use crate::query::VectorSearchRequest;
use crate::store::{MovieStore, MovieStream};
use crate::types::{Movie, MovieId, PendingMovie, VectorIndex, embedding_to_bson};

/// Movie collection on a MongoDB deployment with Atlas Vector Search
pub struct MongoMovieStore {
    collection: Collection<Document>,
}

impl MongoMovieStore {
    /// Connect to the deployment and verify it answers a `ping`.
    ///
    /// The driver connects lazily, so the ping is what surfaces bad hosts or
    /// credentials here instead of on the first query.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        info!(
            "Connecting to {} ({}.{})",
            config.redacted_url(),
            config.database,
            config.collection
        );

        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| StoreError::Connection(format!("invalid connection string: {}", e)))?;
        options.app_name = config.app_name.clone();
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_secs));
        if config.tls_allow_invalid_certificates {
            warn!("TLS certificate validation is disabled for the document store");
            let tls = TlsOptions::builder()
                .allow_invalid_certificates(true)
                .build();
            options.tls = Some(Tls::Enabled(tls));
        }

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);
        info!("Connected to document store");

        Ok(Self { collection })
    }
}

fn exists_filter(path: &str, exists: bool) -> Document {
    let mut filter = Document::new();
    filter.insert(path, doc! { "$exists": exists });
    filter
}

#[async_trait]
impl MovieStore for MongoMovieStore {
    #[instrument(skip(self))]
    async fn describe_vector_index(&self, index: &str, path: &str) -> Result<VectorIndex> {
        let mut cursor = self.collection.list_search_indexes().await?;
        while let Some(entry) = cursor.try_next().await? {
            if entry.get_str("name").ok() != Some(index) {
                continue;
            }
            let found = VectorIndex::from_search_index(&entry, path).ok_or_else(|| {
                StoreError::IndexNotFound {
                    index: index.to_string(),
                    path: path.to_string(),
                }
            })?;
            if !found.queryable {
                warn!("Vector index {} exists but is not queryable yet", index);
            }
            debug!("Found vector index {:?}", found);
            return Ok(found);
        }

        Err(StoreError::IndexNotFound {
            index: index.to_string(),
            path: path.to_string(),
        })
    }

    #[instrument(skip(self, request), fields(index = %request.index, limit = request.limit))]
    async fn vector_search(&self, request: &VectorSearchRequest) -> Result<MovieStream> {
        request.validate()?;
        let cursor = self.collection.aggregate(request.pipeline()).await?;

        let stream = cursor.map(|item| item.map_err(StoreError::from).and_then(Movie::from_document));
        Ok(stream.boxed())
    }

    #[instrument(skip(self))]
    async fn pending_embeddings(&self, path: &str, limit: i64) -> Result<Vec<PendingMovie>> {
        if limit <= 0 {
            return Err(StoreError::InvalidQuery(format!(
                "pending limit must be at least 1, got {}",
                limit
            )));
        }
        let mut filter = exists_filter(path, false);
        filter.insert("plot", doc! { "$exists": true });

        let pending: Vec<PendingMovie> = self
            .collection
            .find(filter)
            .projection(doc! { "title": 1, "plot": 1, "genres": 1 })
            .limit(limit)
            .await?
            .map_ok(PendingMovie::from_document)
            .try_collect()
            .await?;

        for entry in &pending {
            if let PendingMovie::Undecodable { key, reason, .. } = entry {
                warn!("Pending document {} cannot be decoded: {}", key, reason);
            }
        }
        debug!("Found {} documents without embeddings", pending.len());
        Ok(pending)
    }

    #[instrument(skip(self, embedding), fields(dimensions = embedding.len()))]
    async fn store_embedding(&self, id: &MovieId, path: &str, embedding: &[f32]) -> Result<()> {
        let mut fields = Document::new();
        fields.insert(path, embedding_to_bson(embedding));

        let result = self
            .collection
            .update_one(doc! { "_id": *id }, doc! { "$set": fields })
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::MovieNotFound(*id));
        }
        Ok(())
    }

    async fn count_movies(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn count_embedded(&self, path: &str) -> Result<u64> {
        Ok(self
            .collection
            .count_documents(exists_filter(path, true))
            .await?)
    }
}
