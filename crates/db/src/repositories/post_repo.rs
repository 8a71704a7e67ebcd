//! Repository for the `posts` table.

use chrono::NaiveDate;
use quill_core::post::{POST_STATUS_DRAFT, POST_STATUS_PUBLISHED};
use quill_core::types::DbId;
use sqlx::PgPool;

use crate::models::post::{CreatePost, Post};

/// Column list for `posts` queries.
const COLUMNS: &str = "id, title, slug, body, author, publish, status, created_at, updated_at";

/// Read access to posts, plus inserts for seeding.
pub struct PostRepo;

impl PostRepo {
    /// Insert a post. Status defaults to draft and publish time to now.
    pub async fn create(pool: &PgPool, input: &CreatePost) -> Result<Post, sqlx::Error> {
        let query = format!(
            "INSERT INTO posts (title, slug, body, author, publish, status) \
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.body)
            .bind(&input.author)
            .bind(input.publish)
            .bind(input.status.as_deref().unwrap_or(POST_STATUS_DRAFT))
            .fetch_one(pool)
            .await
    }

    /// Find a post by ID regardless of status.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a published post whose publish date (UTC) is `date`.
    pub async fn find_published_by_date(
        pool: &PgPool,
        id: DbId,
        date: NaiveDate,
    ) -> Result<Option<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts \
             WHERE id = $1 AND status = $2 \
               AND (publish AT TIME ZONE 'UTC')::date = $3"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(POST_STATUS_PUBLISHED)
            .bind(date)
            .fetch_optional(pool)
            .await
    }

    /// List published posts, newest first.
    pub async fn list_published(pool: &PgPool) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts WHERE status = $1 ORDER BY publish DESC, id DESC"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(POST_STATUS_PUBLISHED)
            .fetch_all(pool)
            .await
    }
}
