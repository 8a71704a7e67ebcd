//! Blog post entity model and DTOs.

use quill_core::post::date_path;
use quill_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `posts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub author: String,
    pub publish: Timestamp,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Post {
    /// `YYYY/MM/DD` segment of the post's public URL.
    pub fn date_path(&self) -> String {
        date_path(self.publish)
    }
}

/// Post fields shown in listings and above a comment thread.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub publish: Timestamp,
    pub date_path: String,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            author: post.author.clone(),
            publish: post.publish,
            date_path: post.date_path(),
        }
    }
}

/// DTO for inserting a post (seeding and tests; authoring lives elsewhere).
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub author: String,
    pub publish: Option<Timestamp>,
    pub status: Option<String>,
}
