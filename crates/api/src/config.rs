use std::path::PathBuf;
use std::time::Duration;

use quill_core::captcha::{CaptchaPolicy, DEFAULT_IMAGE_PREFIX};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory attachments are written beneath (default: `media`).
    pub media_root: PathBuf,
    /// URL prefix the media root is served at (default: `/media`).
    pub media_url: String,
    pub captcha_length: usize,
    pub captcha_ttl_secs: u64,
    pub captcha_case_sensitive: bool,
    /// Upper bound on decoding and re-encoding one uploaded image.
    pub image_decode_timeout_secs: u64,
    /// Request body limit for comment submissions.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `MEDIA_ROOT`                | `media`                 |
    /// | `MEDIA_URL`                 | `/media`                |
    /// | `CAPTCHA_LENGTH`            | `6`                     |
    /// | `CAPTCHA_TTL_SECS`          | `300`                   |
    /// | `CAPTCHA_CASE_SENSITIVE`    | `true`                  |
    /// | `IMAGE_DECODE_TIMEOUT_SECS` | `10`                    |
    /// | `MAX_UPLOAD_BYTES`          | `10485760`              |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let media_root =
            PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into()));
        let media_url = std::env::var("MEDIA_URL").unwrap_or_else(|_| "/media".into());

        let captcha_length: usize = std::env::var("CAPTCHA_LENGTH")
            .unwrap_or_else(|_| "6".into())
            .parse()
            .expect("CAPTCHA_LENGTH must be a valid usize");

        let captcha_ttl_secs: u64 = std::env::var("CAPTCHA_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("CAPTCHA_TTL_SECS must be a valid u64");

        let captcha_case_sensitive: bool = std::env::var("CAPTCHA_CASE_SENSITIVE")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("CAPTCHA_CASE_SENSITIVE must be true or false");

        let image_decode_timeout_secs: u64 = std::env::var("IMAGE_DECODE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("IMAGE_DECODE_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            media_root,
            media_url,
            captcha_length,
            captcha_ttl_secs,
            captcha_case_sensitive,
            image_decode_timeout_secs,
            max_upload_bytes,
        }
    }

    /// CAPTCHA settings; image URLs live under the API's captcha route.
    pub fn captcha_policy(&self) -> CaptchaPolicy {
        CaptchaPolicy {
            length: self.captcha_length,
            ttl: Duration::from_secs(self.captcha_ttl_secs),
            case_sensitive: self.captcha_case_sensitive,
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
        }
    }

    pub fn image_decode_timeout(&self) -> Duration {
        Duration::from_secs(self.image_decode_timeout_secs)
    }
}
