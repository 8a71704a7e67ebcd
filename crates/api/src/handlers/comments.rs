//! Comment submission handler.
//!
//! Answers with the `{success, ...}` envelope rather than the `{data}` /
//! `{error, code}` pair used elsewhere, because it backs an HTML form.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use quill_core::attachment::Upload;
use quill_core::comment_form::CommentForm;
use quill_core::types::DbId;
use quill_db::models::comment::Comment;

use crate::engine::submission::{submit_comment, Submission};
use crate::error::{AppError, AppResult};
use crate::handlers::posts::PostPath;
use crate::response::SubmissionResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /posts/{year}/{month}/{day}/{post_id}/comments
// ---------------------------------------------------------------------------

/// Accept a multipart comment form with optional `image` and `file` parts.
///
/// The post is resolved by id only; the date segments are not checked here.
/// Malformed paths and non-multipart bodies get the same failure envelope as
/// every other rejection.
pub async fn create_comment(
    State(state): State<AppState>,
    path: Result<PostPath, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match accept_comment(&state, path, multipart).await {
        Ok(comment) => (
            StatusCode::CREATED,
            Json(SubmissionResponse::created(comment.id)),
        )
            .into_response(),
        Err(err) => err.into_submission_response(),
    }
}

async fn accept_comment(
    state: &AppState,
    path: Result<PostPath, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Comment> {
    let (_year, _month, _day, post_id) = path
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?
        .0;
    let multipart = multipart.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let submission = read_submission(post_id, multipart).await?;
    submit_comment(state, submission).await
}

/// Collect the multipart fields into a [`Submission`].
///
/// Unknown fields are ignored. A file part with no name and no content (an
/// untouched file input) counts as absent.
async fn read_submission(post_id: DbId, mut multipart: Multipart) -> AppResult<Submission> {
    let mut form = CommentForm::default();
    let mut image = None;
    let mut text_file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" | "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let upload = Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };
                if name == "image" {
                    image = Some(upload);
                } else {
                    text_file = Some(upload);
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "user_name" => form.user_name = value,
                    "email" => form.email = value,
                    "home_page" => form.home_page = Some(value),
                    "text" => form.text = value,
                    "captcha_key" => form.captcha_key = value,
                    "captcha_value" => form.captcha_value = value,
                    "parent_comment" => form.parent_comment = Some(value),
                    _ => {} // ignore unknown fields
                }
            }
        }
    }

    Ok(Submission {
        post_id,
        form,
        image,
        text_file,
    })
}
