//! Submitted comment form and its field-level validation.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{CommentError, FieldError};
use crate::types::DbId;

/// Maximum length of a commenter's user name.
pub const MAX_USER_NAME_LENGTH: u64 = 255;

/// Maximum length of the CAPTCHA token a commenter may submit.
pub const MAX_CAPTCHA_VALUE_LENGTH: u64 = 6;

/// Form fields in the order their errors are reported.
const FIELD_ORDER: &[&str] = &[
    "user_name",
    "email",
    "home_page",
    "text",
    "captcha_key",
    "captcha_value",
];

static ALPHANUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z]*$").expect("valid regex"));

// Home pages must be web or FTP links.
static HOME_PAGE_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(https?|ftps?)://").expect("valid regex"));

fn validate_home_page_scheme(value: &str) -> Result<(), ValidationError> {
    if HOME_PAGE_SCHEME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("url_scheme")
            .with_message(Cow::Borrowed("Enter a valid URL.")))
    }
}

fn validate_alphanumeric(value: &str) -> Result<(), ValidationError> {
    if ALPHANUMERIC_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("alphanumeric")
            .with_message(Cow::Borrowed("Only alphanumeric characters are allowed.")))
    }
}

/// A comment (or reply) as submitted by a reader.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(
        length(min = 1, max = 255, message = "This field is required (at most 255 characters)."),
        custom(function = "validate_alphanumeric")
    )]
    pub user_name: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(
        url(message = "Enter a valid URL."),
        custom(function = "validate_home_page_scheme")
    )]
    pub home_page: Option<String>,

    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub captcha_key: String,

    #[validate(
        length(min = 1, max = 6, message = "Enter the 1-6 characters shown in the image."),
        custom(function = "validate_alphanumeric")
    )]
    pub captcha_value: String,

    /// Raw `parent_comment` value; see [`CommentForm::parent_id`].
    pub parent_comment: Option<String>,
}

impl CommentForm {
    /// Trim surrounding whitespace and treat a blank home page as absent.
    pub fn normalized(mut self) -> Self {
        self.user_name = self.user_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.captcha_key = self.captcha_key.trim().to_string();
        self.captcha_value = self.captcha_value.trim().to_string();
        self.home_page = self
            .home_page
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        self
    }

    /// The comment being replied to. Blank means a top-level comment.
    pub fn parent_id(&self) -> Result<Option<DbId>, CommentError> {
        let Some(value) = self.parent_comment.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some).map_err(|_| {
            CommentError::Validation(vec![FieldError {
                field: "parent_comment",
                message: "Select a valid comment to reply to.".to_string(),
            }])
        })
    }

    /// Run all field validators, reporting errors in form order.
    pub fn check(&self) -> Result<(), CommentError> {
        self.validate()
            .map_err(|errors| CommentError::Validation(ordered_field_errors(&errors)))
    }
}

/// Flatten validator output into a deterministic, form-ordered list.
pub fn ordered_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let by_field = errors.field_errors();
    FIELD_ORDER
        .iter()
        .filter_map(|field| by_field.get(*field).map(|errs| (*field, errs)))
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field,
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect()
}
