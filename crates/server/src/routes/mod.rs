//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                             - Liveness check
//! GET  /health/ready                       - Readiness check (database ping)
//!
//! # Store (commerce backend import)
//! POST /api/store/import-products          - Import full catalog
//! POST /api/store/import-company           - Import store profile
//! POST /api/store/sync                     - Full import + index sync
//! GET  /api/store/products                 - List stored products
//! GET  /api/store/company                  - Cached store profile
//! PUT  /api/store/update-product/{id}      - Edit curated extra description
//!
//! # Products (vector index)
//! POST /api/products/sync-to-qdrant        - Index full catalog
//! POST /api/products/{id}/sync-to-qdrant   - Index one product
//! POST /api/products/search                - Semantic search
//! GET  /api/products/qdrant/stats          - Collection statistics
//! GET  /api/products/sync/stats            - Sync timestamps
//!
//! # Prompt
//! GET  /api/prompt                         - Read system prompt
//! PUT  /api/prompt                         - Replace system prompt
//! ```

pub mod products;
pub mod prompts;
pub mod store;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Build the full application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .merge(store::router())
        .merge(products::router())
        .merge(prompts::router())
}

/// Liveness check. Always succeeds while the process is up.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check: verifies the database answers.
async fn ready(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Some(pool) = state.pool() {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(pool)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "readiness check failed");
                StatusCode::SERVICE_UNAVAILABLE
            })?;
    }
    Ok(Json(json!({ "status": "ready" })))
}
