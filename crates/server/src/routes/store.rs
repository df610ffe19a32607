//! Store import and catalog handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;
use crate::sync::SyncError;

/// Build the store router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/store/import-products", post(import_products))
        .route("/api/store/import-company", post(import_company))
        .route("/api/store/sync", post(sync_all))
        .route("/api/store/products", get(list_products))
        .route("/api/store/company", get(get_company))
        .route("/api/store/update-product/{id}", put(update_product))
}

/// Import the full product catalog from the commerce backend.
async fn import_products(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.sync().import_products().await.map_err(|err| {
        ApiError::bad_gateway("PRODUCT_IMPORT_ERROR", &err)
    })?;

    Ok(Json(json!({
        "message": "Product import completed",
        "success": report.success,
        "errors": report.errors,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// Import the store profile from the commerce backend.
async fn import_company(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let company = state.sync().import_company().await.map_err(|err| {
        ApiError::bad_gateway("COMPANY_IMPORT_ERROR", &err)
    })?;

    Ok(Json(json!({
        "message": "Company info imported",
        "company": company,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// Run a full sync: company info, products, vector index.
async fn sync_all(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.sync().sync_all().await.map_err(|err| match err {
        SyncError::AlreadyRunning => {
            ApiError::conflict("SYNC_IN_PROGRESS", "A sync is already in progress")
        }
        other => ApiError::bad_gateway("SYNC_ERROR", &other),
    })?;

    Ok(Json(json!({
        "message": "Sync completed",
        "companyImported": report.company_imported,
        "imported": report.imported,
        "indexed": report.indexed,
        "errors": report.errors,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// List the stored product catalog.
async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let products = state
        .storage()
        .list_products()
        .await
        .map_err(|err| ApiError::internal("PRODUCT_LIST_ERROR", &err))?;

    Ok(Json(json!({
        "products": products,
        "count": products.len(),
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// Return the cached store profile.
async fn get_company(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let company = state
        .sync()
        .company_info()
        .await
        .map_err(|err| ApiError::internal("COMPANY_FETCH_ERROR", &err))?
        .ok_or_else(|| {
            ApiError::not_found("COMPANY_NOT_FOUND", "Company info has not been imported")
        })?;

    Ok(Json(json!(company)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProductRequest {
    description_extra: String,
}

/// Replace the curated extra description of a product.
///
/// The body is extracted as a `Result` so a malformed payload comes back in
/// the standard error envelope instead of axum's plain-text rejection.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = body.map_err(|_| {
        ApiError::bad_request(
            "INVALID_DESCRIPTION_EXTRA",
            "descriptionExtra must be a string",
        )
    })?;

    let product = state
        .storage()
        .update_description_extra(&id, &body.description_extra)
        .await
        .map_err(|err| match err {
            crate::db::StorageError::NotFound(_) => {
                ApiError::not_found("PRODUCT_NOT_FOUND", format!("Product {id} not found"))
            }
            other => ApiError::internal("PRODUCT_UPDATE_ERROR", &other),
        })?;

    Ok(Json(json!({
        "message": "Product updated",
        "productId": product.id,
        "descriptionExtra": product.description_extra,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
