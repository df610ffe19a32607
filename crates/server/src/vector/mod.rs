//! Embedding generation and vector indexing.
//!
//! Two seams: [`EmbeddingProvider`] turns text into vectors and
//! [`VectorIndex`] stores and searches them. Production wires `OpenAI` +
//! Qdrant; tests substitute deterministic fakes.

pub mod embeddings;
pub mod indexer;
pub mod qdrant;

pub use embeddings::OpenAiEmbeddings;
pub use indexer::{ProductIndexer, ProductPayload, SearchHit, vector_point_id};
pub use qdrant::QdrantIndex;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors from the embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider responded non-2xx.
    #[error("embedding API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response did not have the expected shape.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors from the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The index responded non-2xx.
    #[error("vector index error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response body could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An existing collection has a different vector dimension than the one
    /// this service is configured for. Fatal: reindexing is required.
    #[error("collection dimension mismatch: index has {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A vector plus payload ready to be written to the index.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: serde_json::Value,
}

/// One search result from the index.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: Uuid,
    pub score: f32,
    pub payload: serde_json::Value,
}

/// Shape of an existing collection.
#[derive(Debug, Clone, Copy)]
pub struct IndexInfo {
    pub dimension: usize,
    /// Number of points currently stored.
    pub count: u64,
}

/// Turns text into fixed-dimension embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Vector dimension every embedding has.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one vector per input in order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// A named vector collection that can be created, written and searched.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection if it does not exist. Idempotent.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), IndexError>;

    /// Describe the collection, or `None` when it does not exist.
    async fn describe(&self) -> Result<Option<IndexInfo>, IndexError>;

    /// Upsert a batch of points. Writing an existing id replaces it.
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<(), IndexError>;

    /// Return the `limit` nearest points to `vector`, best first.
    async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredPoint>, IndexError>;
}
