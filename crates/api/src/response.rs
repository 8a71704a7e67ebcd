//! Shared response envelope types for API handlers.
//!
//! Read endpoints use a `{ "data": ... }` envelope; the comment form answers
//! with [`SubmissionResponse`].

use quill_core::types::DbId;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Successful comment submission: `{ "success": true, "comment_id": .. }`.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub comment_id: DbId,
}

impl SubmissionResponse {
    pub fn created(comment_id: DbId) -> Self {
        Self {
            success: true,
            comment_id,
        }
    }
}
