//! CAPTCHA challenge issuing and image rendering.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;

use quill_core::captcha::render_png;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /captcha/new -- issue a fresh challenge.
pub async fn new_challenge(State(state): State<AppState>) -> impl IntoResponse {
    let issued = state.captcha.issue();
    tracing::debug!(outstanding = state.captcha.len(), "CAPTCHA challenge issued");
    Json(issued)
}

/// GET /captcha/image/{key} -- PNG for a live challenge. Does not consume it.
pub async fn challenge_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let response = state
        .captcha
        .peek_response(&key)
        .ok_or_else(|| AppError::NotFound(format!("CAPTCHA challenge '{key}' not found")))?;

    let png = tokio::task::spawn_blocking(move || render_png(&response))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok((
        [(CONTENT_TYPE, "image/png"), (CACHE_CONTROL, "no-store")],
        png,
    ))
}
