use std::sync::Arc;

use quill_core::captcha::CaptchaStore;

use crate::config::ServerConfig;
use crate::storage::AttachmentStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: quill_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Outstanding CAPTCHA challenges.
    pub captcha: Arc<CaptchaStore>,
    /// Where processed comment attachments are written.
    pub storage: Arc<dyn AttachmentStorage>,
}
