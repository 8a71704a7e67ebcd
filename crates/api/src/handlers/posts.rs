//! Handlers for the public read path: post list, post detail and comment
//! threads.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use quill_core::comment_tree::{build_tree, CommentNode};
use quill_core::error::CoreError;
use quill_core::post::publish_date;
use quill_core::types::DbId;
use quill_db::models::comment::Comment;
use quill_db::models::post::{Post, PostSummary};
use quill_db::repositories::{CommentRepo, PostRepo};

use crate::error::AppResult;
use crate::query::CommentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// `/{year}/{month}/{day}/{post_id}` path segments.
pub type PostPath = Path<(i32, u32, u32, DbId)>;

/// Post detail: every column plus the URL date segment.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub date_path: String,
}

/// A page of a post's comment thread.
#[derive(Debug, Serialize)]
pub struct CommentThread {
    pub post: PostSummary,
    pub comments: Vec<CommentNode<Comment>>,
    pub page: u32,
    pub total_pages: u32,
}

/// Resolve a post on the read path: it must be published and its publish
/// date must match the URL.
pub async fn find_published_post(
    state: &AppState,
    year: i32,
    month: u32,
    day: u32,
    post_id: DbId,
) -> AppResult<Post> {
    let not_found = || CoreError::NotFound {
        entity: "Post",
        id: post_id,
    };

    let date = publish_date(year, month, day).ok_or_else(not_found)?;
    let post = PostRepo::find_published_by_date(&state.pool, post_id, date)
        .await?
        .ok_or_else(not_found)?;
    Ok(post)
}

// ---------------------------------------------------------------------------
// GET /posts
// ---------------------------------------------------------------------------

/// List published posts, newest first.
pub async fn list_posts(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let posts = PostRepo::list_published(&state.pool).await?;
    let data: Vec<PostSummary> = posts.iter().map(PostSummary::from).collect();
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /posts/{year}/{month}/{day}/{post_id}
// ---------------------------------------------------------------------------

pub async fn get_post(
    State(state): State<AppState>,
    Path((year, month, day, post_id)): PostPath,
) -> AppResult<impl IntoResponse> {
    let post = find_published_post(&state, year, month, day, post_id).await?;
    let date_path = post.date_path();
    Ok(Json(DataResponse {
        data: PostDetail { post, date_path },
    }))
}

// ---------------------------------------------------------------------------
// GET /posts/{year}/{month}/{day}/{post_id}/comments
// ---------------------------------------------------------------------------

/// One page of the post's reply tree.
///
/// The whole flat comment list is loaded and assembled in memory; only root
/// comments are paginated.
pub async fn list_comments(
    State(state): State<AppState>,
    Path((year, month, day, post_id)): PostPath,
    Query(params): Query<CommentListParams>,
) -> AppResult<impl IntoResponse> {
    let post = find_published_post(&state, year, month, day, post_id).await?;
    let comments = CommentRepo::list_for_post(&state.pool, post.id).await?;
    let count = comments.len();

    let page = build_tree(comments, params.sort(), params.page());

    tracing::debug!(
        post_id,
        comments = count,
        roots = page.items.len(),
        page = page.page,
        "Comment thread built",
    );

    Ok(Json(CommentThread {
        post: PostSummary::from(&post),
        comments: page.items,
        page: page.page,
        total_pages: page.total_pages,
    }))
}
