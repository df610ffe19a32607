//! Editable system prompt handlers.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the prompt router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/prompt", get(get_prompt).put(update_prompt))
}

/// Read the current system prompt.
async fn get_prompt(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let prompt = state
        .prompts()
        .get()
        .await
        .map_err(|err| ApiError::internal("PROMPT_FETCH_ERROR", &err))?
        .ok_or_else(|| ApiError::not_found("PROMPT_NOT_FOUND", "No prompt has been stored"))?;

    Ok(Json(json!({
        "prompt": prompt,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
struct UpdatePromptRequest {
    prompt: String,
}

/// Replace the system prompt.
async fn update_prompt(
    State(state): State<AppState>,
    Json(body): Json<UpdatePromptRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::bad_request(
            "PROMPT_REQUIRED",
            "Prompt text must not be empty",
        ));
    }

    state
        .prompts()
        .update(&body.prompt)
        .await
        .map_err(|err| ApiError::internal("PROMPT_UPDATE_ERROR", &err))?;

    Ok(Json(json!({
        "message": "Prompt updated",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
