//! Commenter audit log entries.

use quill_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_infos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub user_name: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
