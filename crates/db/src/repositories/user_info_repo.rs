//! Repository for the `user_infos` audit table.

use sqlx::PgPool;

use crate::models::user_info::UserInfo;

const COLUMNS: &str = "id, user_name, email, created_at, updated_at";

/// Append-only log of commenters.
pub struct UserInfoRepo;

impl UserInfoRepo {
    /// Record one (user_name, email) pair. Duplicates are allowed.
    pub async fn record(
        pool: &PgPool,
        user_name: &str,
        email: &str,
    ) -> Result<UserInfo, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_infos (user_name, email) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserInfo>(&query)
            .bind(user_name)
            .bind(email)
            .fetch_one(pool)
            .await
    }
}
