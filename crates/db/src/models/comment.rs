//! Comment entity model and DTOs.

use quill_core::comment_tree::ThreadedComment;
use quill_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub post_id: DbId,
    pub parent_id: Option<DbId>,
    pub user_name: String,
    pub email: String,
    pub home_page: Option<String>,
    pub text: String,
    pub image_path: Option<String>,
    pub text_file_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ThreadedComment for Comment {
    fn id(&self) -> DbId {
        self.id
    }

    fn parent_id(&self) -> Option<DbId> {
        self.parent_id
    }

    fn user_name(&self) -> &str {
        &self.user_name
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// DTO for creating a comment. `text` must already be sanitized and the
/// attachment paths must point at stored files.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub post_id: DbId,
    pub parent_id: Option<DbId>,
    pub user_name: String,
    pub email: String,
    pub home_page: Option<String>,
    pub text: String,
    pub image_path: Option<String>,
    pub text_file_path: Option<String>,
}
