//! Qdrant REST client implementing [`VectorIndex`].
//!
//! Talks to a single named collection with cosine distance. Writes use
//! `?wait=true` so a successful upsert means the points are durably applied,
//! not merely queued.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{IndexError, IndexInfo, ScoredPoint, VectorIndex, VectorPoint};
use crate::config::QdrantConfig;

/// Qdrant collection client.
#[derive(Clone)]
pub struct QdrantIndex {
    inner: Arc<QdrantIndexInner>,
}

struct QdrantIndexInner {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

impl QdrantIndex {
    /// Create a client for one collection.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains invalid header characters.
    #[must_use]
    pub fn new(config: &QdrantConfig, collection: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            headers.insert(
                "api-key",
                HeaderValue::from_str(api_key.expose_secret())
                    .expect("Invalid API key for header"),
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(QdrantIndexInner {
                client,
                base_url: config.url.trim_end_matches('/').to_string(),
                collection: collection.to_string(),
            }),
        }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.inner.base_url, self.inner.collection, suffix
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    #[instrument(skip(self))]
    async fn ensure_collection(&self, dimension: usize) -> Result<(), IndexError> {
        if self.describe().await?.is_some() {
            debug!(collection = %self.inner.collection, "collection already exists");
            return Ok(());
        }

        let body = json!({
            "vectors": { "size": dimension, "distance": "Cosine" }
        });
        let response = self
            .inner
            .client
            .put(self.collection_url(""))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        info!(collection = %self.inner.collection, dimension, "created collection");
        Ok(())
    }

    async fn describe(&self) -> Result<Option<IndexInfo>, IndexError> {
        let response = self
            .inner
            .client
            .get(self.collection_url(""))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        let body: CollectionResponse = response.json().await.map_err(IndexError::Http)?;

        Ok(Some(IndexInfo {
            dimension: body.result.config.params.vectors.size,
            count: body.result.points_count.unwrap_or(0),
        }))
    }

    #[instrument(skip(self, points), fields(count = points.len()))]
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<(), IndexError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<_> = points
            .into_iter()
            .map(|point| {
                json!({
                    "id": point.id.to_string(),
                    "vector": point.vector,
                    "payload": point.payload,
                })
            })
            .collect();

        let response = self
            .inner
            .client
            .put(self.collection_url("/points?wait=true"))
            .json(&json!({ "points": points }))
            .send()
            .await?;
        Self::check(response).await?;

        Ok(())
    }

    #[instrument(skip(self, vector))]
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });

        let response = self
            .inner
            .client
            .post(self.collection_url("/points/search"))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body: SearchResponse = response.json().await.map_err(IndexError::Http)?;

        body.result
            .into_iter()
            .map(|point| {
                let id = Uuid::parse_str(&point.id).map_err(|err| {
                    IndexError::Parse(serde::de::Error::custom(format!(
                        "point id {}: {err}",
                        point.id
                    )))
                })?;
                Ok(ScoredPoint {
                    id,
                    score: point.score,
                    payload: point.payload.unwrap_or(serde_json::Value::Null),
                })
            })
            .collect()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    result: CollectionResult,
}

#[derive(Debug, Deserialize)]
struct CollectionResult {
    points_count: Option<u64>,
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Debug, Deserialize)]
struct VectorParams {
    size: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchPoint>,
}

#[derive(Debug, Deserialize)]
struct SearchPoint {
    id: String,
    score: f32,
    payload: Option<serde_json::Value>,
}
