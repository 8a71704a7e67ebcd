//! Domain logic for the Quill blog: comment forms, sanitization,
//! attachments, CAPTCHA challenges and reply trees.
//!
//! Nothing in this crate touches the database or the network.

pub mod attachment;
pub mod captcha;
pub mod comment_form;
pub mod comment_tree;
pub mod error;
pub mod pagination;
pub mod post;
pub mod sanitize;
pub mod types;
