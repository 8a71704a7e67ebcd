use crate::types::DbId;

/// Lookup failures on the read path.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },
}

/// A single offending form field and its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Failure kinds of the comment submission pipeline.
///
/// Every variant is recoverable at the HTTP boundary; the `Display` output is
/// the message surfaced to the commenter.
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Only the first field error is surfaced; the rest are kept for logging.
    #[error("{}", first_field_message(.0))]
    Validation(Vec<FieldError>),

    #[error("Incorrect CAPTCHA")]
    IncorrectCaptcha,

    #[error("Parent comment {parent_id} does not belong to post {post_id}")]
    InvalidParent { parent_id: DbId, post_id: DbId },

    #[error("Comment text is not well-formed markup")]
    InvalidMarkup,

    #[error("Unsupported media type '{0}'. Allowed: image/jpeg, image/png, image/gif")]
    UnsupportedMediaType(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid file format '{0}'. Only .txt files are allowed")]
    UnsupportedFileType(String),

    #[error("File size exceeds the allowed limit of {limit} bytes ({size} bytes)")]
    FileTooLarge { size: usize, limit: usize },
}

fn first_field_message(errors: &[FieldError]) -> String {
    match errors.first() {
        Some(e) => format!("{}: {}", e.field, e.message),
        None => "Invalid form data".to_string(),
    }
}

impl CommentError {
    /// Whether the error means "the addressed resource does not exist here".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidParent { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_surfaces_first_field_only() {
        let err = CommentError::Validation(vec![
            FieldError {
                field: "email",
                message: "Enter a valid email address.".into(),
            },
            FieldError {
                field: "text",
                message: "This field is required.".into(),
            },
        ]);
        assert_eq!(err.to_string(), "email: Enter a valid email address.");
    }

    #[test]
    fn captcha_message_is_stable() {
        assert_eq!(CommentError::IncorrectCaptcha.to_string(), "Incorrect CAPTCHA");
    }

    #[test]
    fn file_type_message_prefix() {
        let err = CommentError::UnsupportedFileType("report.pdf".into());
        assert!(err.to_string().starts_with("Invalid file format"));
    }

    #[test]
    fn parent_errors_count_as_not_found() {
        assert!(CommentError::NotFound { entity: "Comment", id: 3 }.is_not_found());
        assert!(CommentError::InvalidParent { parent_id: 3, post_id: 1 }.is_not_found());
        assert!(!CommentError::InvalidMarkup.is_not_found());
    }
}
