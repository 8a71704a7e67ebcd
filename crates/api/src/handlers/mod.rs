pub mod captcha;
pub mod comments;
pub mod posts;
