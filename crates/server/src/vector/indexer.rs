//! Product embedding pipeline.
//!
//! Indexes the product catalog into a vector collection for semantic search.
//! Point ids are UUIDv5 of the product id under a fixed namespace, so
//! re-indexing the same product always overwrites its previous point instead
//! of accumulating duplicates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::{Uuid, uuid};

use shopflow_core::{ImportReport, Product, SyncKind};

use super::{EmbeddingError, EmbeddingProvider, IndexError, IndexInfo, VectorIndex, VectorPoint};
use crate::db::{Storage, StorageError};

/// Namespace for deterministic product point ids.
pub const PRODUCT_ID_NAMESPACE: Uuid = uuid!("6ba7b810-9dad-11d1-80b4-00c04fd430c8");

/// Collection holding product embeddings.
pub const PRODUCTS_COLLECTION: &str = "products";

/// Products embedded per request batch.
const BATCH_SIZE: usize = 100;

/// Deterministic point id for a product. Stable across runs and processes.
#[must_use]
pub fn vector_point_id(product_id: &str) -> Uuid {
    Uuid::new_v5(&PRODUCT_ID_NAMESPACE, product_id.as_bytes())
}

/// Errors from the indexing pipeline.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The product to index does not exist in storage.
    #[error("product not found: {0}")]
    ProductNotFound(String),
}

/// Payload stored alongside each product vector, camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub id: String,
    pub name: String,
    pub description: String,
    pub description_extra: String,
    pub price: f64,
    pub stock: u32,
    pub image_url: String,
    pub product_url: String,
    /// The exact text that was embedded.
    pub text: String,
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            description_extra: product.description_extra.clone(),
            price: product.price,
            stock: product.stock,
            image_url: product.image_url.clone(),
            product_url: product.product_url.clone(),
            text: product.embedding_text(),
        }
    }
}

/// One semantic search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub score: f32,
    pub payload: serde_json::Value,
}

/// Drives the catalog-to-index pipeline.
pub struct ProductIndexer {
    storage: Arc<dyn Storage>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl ProductIndexer {
    #[must_use]
    pub fn new(
        storage: Arc<dyn Storage>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            storage,
            embedder,
            index,
        }
    }

    /// Create the collection on first use and verify its dimension matches
    /// the embedding model on every start.
    ///
    /// # Errors
    ///
    /// Fails with [`IndexError::DimensionMismatch`] when an existing
    /// collection was built with a different model; that requires a manual
    /// reindex and must not be papered over.
    pub async fn ensure_collection(&self) -> Result<(), IndexerError> {
        let expected = self.embedder.dimension();
        if let Some(info) = self.index.describe().await? {
            if info.dimension != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: info.dimension,
                }
                .into());
            }
            return Ok(());
        }
        self.index.ensure_collection(expected).await?;
        Ok(())
    }

    /// Embed and index every product in storage, in batches.
    ///
    /// Best-effort per batch: a failing batch is tallied as errors and the
    /// run continues. The Qdrant sync timestamp advances only when at least
    /// one point was written.
    ///
    /// # Errors
    ///
    /// Fails only when the catalog itself cannot be read.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<ImportReport, IndexerError> {
        let products = self.storage.list_products().await?;
        let mut report = ImportReport::default();

        for batch in products.chunks(BATCH_SIZE) {
            match self.index_batch(batch).await {
                Ok(()) => report.success += batch.len() as u32,
                Err(err) => {
                    error!(error = %err, batch_len = batch.len(), "batch indexing failed");
                    report.errors += batch.len() as u32;
                }
            }
        }

        if report.success > 0
            && let Err(err) = self.storage.record_sync(SyncKind::Qdrant).await
        {
            // The index write already happened; losing the timestamp is not
            // worth failing the run over.
            warn!(error = %err, "failed to record qdrant sync timestamp");
        }

        info!(
            success = report.success,
            errors = report.errors,
            "product index sync finished"
        );
        Ok(report)
    }

    /// Embed and index one product by id.
    ///
    /// # Errors
    ///
    /// Fails with [`IndexerError::ProductNotFound`] when the id is unknown.
    #[instrument(skip(self))]
    pub async fn sync_one(&self, product_id: &str) -> Result<(), IndexerError> {
        let product = self
            .storage
            .get_product(product_id)
            .await?
            .ok_or_else(|| IndexerError::ProductNotFound(product_id.to_string()))?;

        self.index_batch(std::slice::from_ref(&product)).await?;

        if let Err(err) = self.storage.record_sync(SyncKind::Qdrant).await {
            warn!(error = %err, "failed to record qdrant sync timestamp");
        }
        Ok(())
    }

    /// Semantic search over the indexed catalog.
    ///
    /// # Errors
    ///
    /// Fails when the query cannot be embedded or the index query fails.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, IndexerError> {
        let mut vectors = self.embedder.embed_batch(&[query]).await?;
        let vector = vectors.pop().ok_or_else(|| {
            EmbeddingError::InvalidResponse("no embedding for query".to_string())
        })?;

        let points = self.index.search(vector, limit).await?;
        Ok(points
            .into_iter()
            .map(|point| SearchHit {
                score: point.score,
                payload: point.payload,
            })
            .collect())
    }

    /// Collection statistics, or `None` when it has not been created yet.
    ///
    /// # Errors
    ///
    /// Fails when the index cannot be reached.
    pub async fn stats(&self) -> Result<Option<IndexInfo>, IndexerError> {
        Ok(self.index.describe().await?)
    }

    /// Embed one batch, write it to the index, then persist the vectors back
    /// onto the stored products.
    async fn index_batch(&self, products: &[Product]) -> Result<(), IndexerError> {
        let texts: Vec<String> = products.iter().map(Product::embedding_text).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed_batch(&text_refs).await?;

        let points = products
            .iter()
            .zip(vectors.iter())
            .map(|(product, vector)| VectorPoint {
                id: vector_point_id(&product.id),
                vector: vector.clone(),
                payload: json!(ProductPayload::from(product)),
            })
            .collect();
        self.index.upsert(points).await?;

        for (product, vector) in products.iter().zip(vectors) {
            let mut updated = product.clone();
            updated.embeddings = Some(vector);
            self.storage.upsert_product(&updated).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_deterministic() {
        let a = vector_point_id("42");
        let b = vector_point_id("42");
        assert_eq!(a, b);
    }

    #[test]
    fn point_id_differs_per_product() {
        assert_ne!(vector_point_id("42"), vector_point_id("43"));
    }

    #[test]
    fn payload_serializes_camel_case() {
        let product = Product {
            id: "42".to_string(),
            name: "Boots".to_string(),
            description: "dry".to_string(),
            description_extra: "hand-made".to_string(),
            price: 10.0,
            stock: 1,
            image_url: "https://cdn.example.com/b.jpg".to_string(),
            product_url: String::new(),
            embeddings: None,
        };

        let payload = serde_json::to_value(ProductPayload::from(&product)).expect("serialize");
        assert!(payload.get("descriptionExtra").is_some());
        assert!(payload.get("imageUrl").is_some());
        assert_eq!(payload["text"], "Boots dry hand-made");
    }
}
