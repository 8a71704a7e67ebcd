//! Attachment storage collaborator.
//!
//! The submission pipeline hands processed attachments to an
//! [`AttachmentStorage`]; the stored path is what ends up on the comment row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quill_core::attachment::{AttachmentKind, ProcessedAttachment};
use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an attachment was written, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub kind: AttachmentKind,
    /// Forward-slash separated, e.g. `images/<uuid>_cat.png`.
    pub path: String,
}

/// Persists attachment bytes somewhere addressable.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Write the attachment under a fresh unique name.
    async fn save(
        &self,
        attachment: &ProcessedAttachment,
    ) -> Result<StoredAttachment, StorageError>;

    /// Remove a previously saved attachment. Missing files are not an error.
    async fn remove(&self, stored: &StoredAttachment) -> Result<(), StorageError>;
}

/// Filesystem storage: `<root>/images/...` and `<root>/text_files/...`.
#[derive(Debug, Clone)]
pub struct LocalAttachmentStorage {
    root: PathBuf,
}

impl LocalAttachmentStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AttachmentStorage for LocalAttachmentStorage {
    async fn save(
        &self,
        attachment: &ProcessedAttachment,
    ) -> Result<StoredAttachment, StorageError> {
        let namespace = attachment.kind.namespace();
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir).await?;

        let file_name = format!(
            "{}_{}",
            uuid::Uuid::new_v4().simple(),
            safe_file_name(&attachment.file_name)
        );
        fs::write(dir.join(&file_name), &attachment.bytes).await?;

        let path = format!("{namespace}/{file_name}");
        tracing::info!(path = %path, bytes = attachment.bytes.len(), "Attachment stored");

        Ok(StoredAttachment {
            kind: attachment.kind,
            path,
        })
    }

    async fn remove(&self, stored: &StoredAttachment) -> Result<(), StorageError> {
        match fs::remove_file(self.root.join(&stored.path)).await {
            Ok(()) => {
                tracing::info!(path = %stored.path, "Attachment removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replace anything outside `[A-Za-z0-9._-]` so the name is a single safe
/// path segment.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_attachment(name: &str) -> ProcessedAttachment {
        ProcessedAttachment {
            kind: AttachmentKind::TextFile,
            file_name: name.to_string(),
            content_type: "text/plain".to_string(),
            bytes: b"hello".to_vec(),
            dimensions: None,
        }
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(safe_file_name("my notes (1).txt"), "my_notes__1_.txt");
        assert_eq!(safe_file_name("..hidden.txt"), "hidden.txt");
        assert_eq!(safe_file_name(""), "upload");
    }

    #[tokio::test]
    async fn save_writes_under_namespace_and_remove_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalAttachmentStorage::new(dir.path());

        let stored = storage.save(&text_attachment("notes.txt")).await.unwrap();
        assert!(stored.path.starts_with("text_files/"));
        assert!(stored.path.ends_with("_notes.txt"));

        let on_disk = dir.path().join(&stored.path);
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"hello");

        storage.remove(&stored).await.unwrap();
        assert!(!on_disk.exists());
        // Second removal is a no-op.
        storage.remove(&stored).await.unwrap();
    }

    #[tokio::test]
    async fn same_name_gets_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalAttachmentStorage::new(dir.path());

        let a = storage.save(&text_attachment("a.txt")).await.unwrap();
        let b = storage.save(&text_attachment("a.txt")).await.unwrap();
        assert_ne!(a.path, b.path);
    }
}
