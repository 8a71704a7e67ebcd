pub mod captcha;
pub mod health;
pub mod posts;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /posts                                            list published posts
/// /posts/{year}/{month}/{day}/{post_id}             post detail
/// /posts/{year}/{month}/{day}/{post_id}/comments    comment thread (GET), submit (POST)
///
/// /captcha/new                                      issue challenge
/// /captcha/image/{key}                              challenge image (PNG)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router())
        .nest("/captcha", captcha::router())
}
