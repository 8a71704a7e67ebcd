#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use quill_api::config::ServerConfig;
use quill_api::router::build_app_router;
use quill_api::state::AppState;
use quill_api::storage::{AttachmentStorage, LocalAttachmentStorage};
use quill_core::captcha::CaptchaStore;
use quill_db::models::comment::{Comment, CreateComment};
use quill_db::models::post::{CreatePost, Post};
use quill_db::repositories::{CommentRepo, PostRepo};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(media_root: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        media_root,
        media_url: "/media".to_string(),
        captcha_length: 6,
        captcha_ttl_secs: 300,
        captcha_case_sensitive: true,
        image_decode_timeout_secs: 10,
        max_upload_bytes: 10 * 1024 * 1024,
    }
}

/// Router plus the state behind it, so tests can reach the CAPTCHA store and
/// the media directory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub media: TempDir,
}

impl TestApp {
    pub fn media_path(&self, relative: &str) -> PathBuf {
        self.media.path().join(relative)
    }

    /// Issue a challenge and read back its answer without consuming it.
    pub fn solve_captcha(&self) -> (String, String) {
        let issued = self.state.captcha.issue();
        let answer = self
            .state
            .captcha
            .peek_response(&issued.key)
            .expect("fresh challenge");
        (issued.key, answer)
    }
}

/// Build the full application with the production middleware stack.
pub fn test_app(pool: PgPool) -> TestApp {
    test_app_with_storage(pool, |root| Arc::new(LocalAttachmentStorage::new(root)))
}

/// Like [`test_app`], with attachment storage built over the temp media root.
pub fn test_app_with_storage(
    pool: PgPool,
    storage: impl FnOnce(&Path) -> Arc<dyn AttachmentStorage>,
) -> TestApp {
    let media = tempfile::tempdir().expect("temp media dir");
    let config = test_config(media.path().to_path_buf());

    let state = AppState {
        pool,
        captcha: Arc::new(CaptchaStore::new(config.captcha_policy())),
        storage: storage(media.path()),
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        media,
    }
}

/// Router only, for tests that never touch attachments.
pub fn build_test_app(pool: PgPool) -> Router {
    test_app(pool).router
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_multipart(app: Router, uri: &str, form: MultipartForm) -> Response<Body> {
    let (content_type, body) = form.finish();
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST an arbitrary body with the given content type.
pub async fn post_raw(app: Router, uri: &str, content_type: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Regular files anywhere under `dir`.
pub fn count_files(dir: &Path) -> usize {
    let mut count = 0;
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                count += 1;
            }
        }
    }
    count
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Minimal `multipart/form-data` encoder.
pub struct MultipartForm {
    body: Vec<u8>,
}

const BOUNDARY: &str = "quill-test-boundary-7MA4YWxkTrZu0gW";

impl MultipartForm {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.body)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Publish date used by every seeded post: 2024-03-05.
pub const POST_DATE: &str = "2024/03/05";

pub async fn seed_post(pool: &PgPool, title: &str, status: &str) -> Post {
    PostRepo::create(
        pool,
        &CreatePost {
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            body: format!("{title} body"),
            author: "editor".to_string(),
            publish: Some(Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap()),
            status: Some(status.to_string()),
        },
    )
    .await
    .unwrap()
}

pub async fn seed_comment(
    pool: &PgPool,
    post_id: i64,
    parent_id: Option<i64>,
    user_name: &str,
) -> Comment {
    CommentRepo::create(
        pool,
        &CreateComment {
            post_id,
            parent_id,
            user_name: user_name.to_string(),
            email: format!("{user_name}@example.com"),
            home_page: None,
            text: format!("Comment by {user_name}"),
            image_path: None,
            text_file_path: None,
        },
    )
    .await
    .unwrap()
}

pub fn comments_uri(post_id: i64) -> String {
    format!("/api/v1/posts/{POST_DATE}/{post_id}/comments")
}
