use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quill_core::error::{CommentError, CoreError};
use serde_json::json;

use crate::storage::StorageError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`CommentError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// `{error, code}` JSON; the comment submission endpoint uses
/// [`AppError::into_submission_response`] instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A comment submission was rejected.
    #[error(transparent)]
    Comment(#[from] CommentError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Attachment storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A resource addressed by something other than a database id.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl AppError {
    /// HTTP status, stable error code and client-facing message.
    ///
    /// Internal failures are logged here and replaced by a generic message.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            // --- CoreError variants ---
            AppError::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),

            // --- Comment submission errors ---
            AppError::Comment(err) => {
                let code = match err {
                    CommentError::NotFound { .. } | CommentError::InvalidParent { .. } => {
                        "NOT_FOUND"
                    }
                    CommentError::Validation(_) => "VALIDATION_ERROR",
                    CommentError::IncorrectCaptcha => "INCORRECT_CAPTCHA",
                    CommentError::InvalidMarkup => "INVALID_MARKUP",
                    CommentError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
                    CommentError::InvalidImage(_) => "INVALID_IMAGE",
                    CommentError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
                    CommentError::FileTooLarge { .. } => "FILE_TOO_LARGE",
                };
                let status = if err.is_not_found() {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::BAD_REQUEST
                };
                (status, code, err.to_string())
            }

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            AppError::Storage(err) => {
                tracing::error!(error = %err, "Attachment storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        }
    }

    /// Render as the `{success: false, message}` envelope of the comment form.
    pub fn into_submission_response(self) -> Response {
        let (status, code, message) = self.classify();
        tracing::info!(status = status.as_u16(), code, message = %message, "Comment rejected");

        let body = json!({
            "success": false,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Foreign key violations (a parent or post deleted mid-submission) map to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL foreign key violation
            if db_err.code().as_deref() == Some("23503") {
                return (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Referenced resource not found".to_string(),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
