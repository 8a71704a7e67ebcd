//! Repository for the `comments` table.

use quill_core::types::DbId;
use sqlx::PgPool;

use crate::models::comment::{Comment, CreateComment};

/// Column list for `comments` queries.
const COLUMNS: &str = "\
    id, post_id, parent_id, user_name, email, home_page, text, \
    image_path, text_file_path, created_at, updated_at";

/// Provides persistence for comments and their reply subtrees.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment, returning the full row.
    ///
    /// A `parent_id` on a different post violates the composite foreign key.
    pub async fn create(pool: &PgPool, input: &CreateComment) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments \
                (post_id, parent_id, user_name, email, home_page, text, \
                 image_path, text_file_path) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(input.post_id)
            .bind(input.parent_id)
            .bind(&input.user_name)
            .bind(&input.email)
            .bind(&input.home_page)
            .bind(&input.text)
            .bind(&input.image_path)
            .bind(&input.text_file_path)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All comments on a post as a flat list in id order.
    pub async fn list_for_post(pool: &PgPool, post_id: DbId) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE post_id = $1 ORDER BY id");
        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a comment together with every reply beneath it.
    ///
    /// Returns the deleted rows (empty if `id` does not exist). The subtree is
    /// collected and removed in one statement inside a transaction so the
    /// parent foreign key is never observed dangling.
    pub async fn delete_subtree(pool: &PgPool, id: DbId) -> Result<Vec<Comment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "WITH RECURSIVE subtree AS ( \
                 SELECT id FROM comments WHERE id = $1 \
                 UNION \
                 SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id \
             ) \
             DELETE FROM comments WHERE id IN (SELECT id FROM subtree) \
             RETURNING {COLUMNS}"
        );
        let deleted = sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(comment_id = id, deleted = deleted.len(), "Comment subtree deleted");
        Ok(deleted)
    }
}
