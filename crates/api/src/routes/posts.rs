//! Route definitions for posts and their comment threads.
//!
//! Mounted at `/posts` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{comments, posts};
use crate::state::AppState;

/// ```text
/// GET    /                                      -> list_posts
/// GET    /{year}/{month}/{day}/{post_id}           -> get_post
/// GET    /{year}/{month}/{day}/{post_id}/comments  -> list_comments
/// POST   /{year}/{month}/{day}/{post_id}/comments  -> create_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts))
        .route("/{year}/{month}/{day}/{post_id}", get(posts::get_post))
        .route(
            "/{year}/{month}/{day}/{post_id}/comments",
            get(posts::list_comments).post(comments::create_comment),
        )
}
