//! Vector index handlers: indexing, search and statistics.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;
use crate::vector::indexer::{IndexerError, PRODUCTS_COLLECTION};

/// Default number of search results.
const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Upper bound on a requested result count; anything above is clamped.
const MAX_SEARCH_LIMIT: usize = 50;

/// Effective result count for a request: default when absent, clamped to
/// `1..=MAX_SEARCH_LIMIT` otherwise.
fn effective_limit(requested: Option<usize>) -> usize {
    requested.map_or(DEFAULT_SEARCH_LIMIT, |limit| {
        limit.clamp(1, MAX_SEARCH_LIMIT)
    })
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products/sync-to-qdrant", post(sync_to_qdrant))
        .route("/api/products/{id}/sync-to-qdrant", post(sync_one_to_qdrant))
        .route("/api/products/search", post(search))
        .route("/api/products/qdrant/stats", get(qdrant_stats))
        .route("/api/products/sync/stats", get(sync_stats))
}

/// Embed and index the full stored catalog.
async fn sync_to_qdrant(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state
        .indexer()
        .sync_all()
        .await
        .map_err(|err| ApiError::bad_gateway("SYNC_TO_QDRANT_ERROR", &err))?;

    Ok(Json(json!({
        "message": "Products synced to Qdrant",
        "synced": report.success,
        "errors": report.errors,
        "collection": PRODUCTS_COLLECTION,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// Embed and index a single stored product.
async fn sync_one_to_qdrant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.indexer().sync_one(&id).await.map_err(|err| match err {
        IndexerError::ProductNotFound(_) => {
            ApiError::not_found("PRODUCT_NOT_FOUND", format!("Product {id} not found"))
        }
        other => ApiError::bad_gateway("SYNC_TO_QDRANT_ERROR", &other),
    })?;

    Ok(Json(json!({
        "message": "Product synced to Qdrant",
        "productId": id,
        "collection": PRODUCTS_COLLECTION,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: Option<String>,
    limit: Option<usize>,
}

/// Semantic search over the indexed catalog.
async fn search(
    State(state): State<AppState>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = body
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("QUERY_REQUIRED", "A search query is required"))?;

    let limit = effective_limit(body.limit);
    let hits = state
        .indexer()
        .search(query, limit)
        .await
        .map_err(|err| ApiError::bad_gateway("QDRANT_SEARCH_ERROR", &err))?;

    let results: Vec<_> = hits
        .into_iter()
        .map(|hit| {
            let product_id = hit
                .payload
                .get("id")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            json!({
                "productId": product_id,
                "score": hit.score,
                "product": hit.payload,
            })
        })
        .collect();

    Ok(Json(json!({
        "query": query,
        "count": results.len(),
        "results": results,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// Collection statistics.
async fn qdrant_stats(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let info = state
        .indexer()
        .stats()
        .await
        .map_err(|err| ApiError::bad_gateway("QDRANT_STATS_ERROR", &err))?
        .ok_or_else(|| {
            ApiError::not_found("COLLECTION_NOT_FOUND", "Collection has not been created")
        })?;

    Ok(Json(json!({
        "collection": PRODUCTS_COLLECTION,
        "count": info.count,
        "dimension": info.dimension,
        "metric": "cosine",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// Last successful sync per source.
async fn sync_stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let meta = state
        .storage()
        .sync_metadata()
        .await
        .map_err(|err| ApiError::internal("SYNC_STATS_ERROR", &err))?;

    Ok(Json(json!({
        "lastShopifySync": meta.last_shopify_sync,
        "lastWooCommerceSync": meta.last_woo_commerce_sync,
        "lastQdrantSync": meta.last_qdrant_sync,
        "syncInProgress": state.sync().is_running(),
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_when_absent() {
        assert_eq!(effective_limit(None), DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn limit_is_clamped_to_bounds() {
        assert_eq!(effective_limit(Some(0)), 1);
        assert_eq!(effective_limit(Some(7)), 7);
        assert_eq!(effective_limit(Some(10_000)), MAX_SEARCH_LIMIT);
    }
}
