//! `OpenAI` embedding provider.
//!
//! Uses `text-embedding-3-small` (1536 dimensions). Batches go out as a
//! single request; the response is validated for count and dimension before
//! any vector reaches the index.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{EmbeddingError, EmbeddingProvider};

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Vector dimension of [`EMBEDDING_MODEL`].
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// Embedding client for the `OpenAI` API.
#[derive(Clone)]
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
}

impl OpenAiEmbeddings {
    /// Create a new embedding client.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains invalid header characters.
    #[must_use]
    pub fn new(api_key: &secrecy::SecretString) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .expect("Invalid API key for header"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL.to_string(),
            input: texts.iter().map(|s| (*s).to_string()).collect(),
        };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: EmbeddingResponse = response
            .json()
            .await
            .map_err(EmbeddingError::Http)?;

        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != EMBEDDING_DIMENSIONS {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "Embedding {} has {} dimensions, expected {}",
                    i,
                    embedding.len(),
                    EMBEDDING_DIMENSIONS
                )));
            }
        }

        Ok(embeddings)
    }
}

/// Request body for batch text embedding.
#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

/// Response from the `OpenAI` embeddings API.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_constants() {
        assert_eq!(EMBEDDING_DIMENSIONS, 1536);
        assert_eq!(EMBEDDING_MODEL, "text-embedding-3-small");
    }
}
