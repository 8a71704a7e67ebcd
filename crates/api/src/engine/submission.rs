//! Comment submission pipeline.
//!
//! Every step is a hard gate: the first failure aborts and nothing visible is
//! written. The only state change before the final insert is the CAPTCHA
//! challenge being consumed (and the best-effort commenter log).

use std::time::Duration;

use quill_core::attachment::{
    process_image, process_text_file, AttachmentKind, ProcessedAttachment, Upload,
};
use quill_core::comment_form::CommentForm;
use quill_core::error::CommentError;
use quill_core::sanitize::{sanitize, validate_markup, SanitizePolicy};
use quill_core::types::DbId;
use quill_db::models::comment::{Comment, CreateComment};
use quill_db::repositories::{CommentRepo, PostRepo, UserInfoRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::{AttachmentStorage, StoredAttachment};

/// One comment (or reply) as received from the form.
#[derive(Debug, Clone)]
pub struct Submission {
    pub post_id: DbId,
    pub form: CommentForm,
    pub image: Option<Upload>,
    pub text_file: Option<Upload>,
}

/// Validate and persist a new comment, returning the stored row.
pub async fn submit_comment(state: &AppState, submission: Submission) -> AppResult<Comment> {
    let Submission {
        post_id,
        form,
        image,
        text_file,
    } = submission;

    // 1. The post must exist; publish status is only checked on reads.
    PostRepo::find_by_id(&state.pool, post_id)
        .await?
        .ok_or(CommentError::NotFound {
            entity: "Post",
            id: post_id,
        })?;

    // 2. Field validation.
    let form = form.normalized();
    form.check()?;
    let parent_id = form.parent_id()?;

    // 3. CAPTCHA; the challenge is consumed whatever the outcome.
    if !state.captcha.check(&form.captcha_key, &form.captcha_value) {
        return Err(CommentError::IncorrectCaptcha.into());
    }

    // 4. Parent must be on the same post.
    if let Some(parent_id) = parent_id {
        let parent = CommentRepo::find_by_id(&state.pool, parent_id)
            .await?
            .ok_or(CommentError::NotFound {
                entity: "Comment",
                id: parent_id,
            })?;
        if parent.post_id != post_id {
            return Err(CommentError::InvalidParent { parent_id, post_id }.into());
        }
    }

    // 5. Sanitize, then require well-formed, non-empty markup.
    let text = sanitize(&form.text, &SanitizePolicy::comment_default());
    if text.trim().is_empty() || !validate_markup(&text) {
        return Err(CommentError::InvalidMarkup.into());
    }

    // 6-7. Attachments.
    let image = match image {
        Some(upload) => {
            Some(process_image_bounded(upload, state.config.image_decode_timeout()).await?)
        }
        None => None,
    };
    let text_file = text_file.map(process_text_file).transpose()?;

    // 8. Commenter log; failure here does not block the comment.
    if let Err(e) = UserInfoRepo::record(&state.pool, &form.user_name, &form.email).await {
        tracing::warn!(error = %e, user_name = %form.user_name, "Failed to record commenter info");
    }

    // 9. Store attachments, then insert; undo the stores if the insert fails.
    let stored = store_all(state.storage.as_ref(), [image, text_file]).await?;
    let path_of = |kind: AttachmentKind| {
        stored
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.path.clone())
    };

    let input = CreateComment {
        post_id,
        parent_id,
        user_name: form.user_name.clone(),
        email: form.email.clone(),
        home_page: form.home_page.clone(),
        text,
        image_path: path_of(AttachmentKind::Image),
        text_file_path: path_of(AttachmentKind::TextFile),
    };

    match CommentRepo::create(&state.pool, &input).await {
        Ok(comment) => {
            tracing::info!(
                comment_id = comment.id,
                post_id,
                parent_id = ?comment.parent_id,
                attachments = stored.len(),
                "Comment created",
            );
            Ok(comment)
        }
        Err(e) => {
            discard(state.storage.as_ref(), &stored).await;
            Err(e.into())
        }
    }
}

/// Decode and re-encode an image on the blocking pool under a deadline.
async fn process_image_bounded(upload: Upload, limit: Duration) -> AppResult<ProcessedAttachment> {
    let task = tokio::task::spawn_blocking(move || process_image(upload));
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(join_err)) => Err(AppError::InternalError(format!(
            "Image processing task failed: {join_err}"
        ))),
        Err(_) => Err(CommentError::InvalidImage(format!(
            "decoding took longer than {}s",
            limit.as_secs()
        ))
        .into()),
    }
}

/// Store each present attachment; on failure remove the ones already stored.
async fn store_all<const N: usize>(
    storage: &dyn AttachmentStorage,
    attachments: [Option<ProcessedAttachment>; N],
) -> AppResult<Vec<StoredAttachment>> {
    let mut stored = Vec::with_capacity(N);
    for attachment in attachments.into_iter().flatten() {
        match storage.save(&attachment).await {
            Ok(s) => stored.push(s),
            Err(e) => {
                discard(storage, &stored).await;
                return Err(e.into());
            }
        }
    }
    Ok(stored)
}

async fn discard(storage: &dyn AttachmentStorage, stored: &[StoredAttachment]) {
    for s in stored {
        if let Err(e) = storage.remove(s).await {
            tracing::warn!(error = %e, path = %s.path, "Failed to remove orphaned attachment");
        }
    }
}
