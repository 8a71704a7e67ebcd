//! Mounted at `/captcha` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::captcha;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(captcha::new_challenge))
        .route("/image/{key}", get(captcha::challenge_image))
}
