//! Comment attachment validation and image transcoding.
//!
//! Images are accepted as JPEG, PNG or GIF (by declared content type), decoded
//! in that declared format, forced to exactly [`MAX_IMAGE_WIDTH`] x
//! [`MAX_IMAGE_HEIGHT`] when either side overflows the box, and re-encoded in
//! the declared format. Text files must be `.txt` and at most
//! [`MAX_TEXT_FILE_BYTES`].
//!
//! The forced resize does not preserve aspect ratio; an 800x100 banner comes
//! out as 320x240.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::CommentError;

/// Bounding box width for image attachments.
pub const MAX_IMAGE_WIDTH: u32 = 320;

/// Bounding box height for image attachments.
pub const MAX_IMAGE_HEIGHT: u32 = 240;

/// Maximum size of a text-file attachment (100 KiB).
pub const MAX_TEXT_FILE_BYTES: usize = 100 * 1024;

/// Accepted image content types.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

/// Accepted text-file extension (matched case-sensitively, like the stored name).
pub const TEXT_FILE_EXTENSION: &str = ".txt";

/// Fallback base name when an upload carries no usable file name.
const DEFAULT_TEXT_FILE_NAME: &str = "attachment.txt";

/// Fallback stem for image uploads with no usable file name.
const DEFAULT_IMAGE_STEM: &str = "image";

/// Which storage namespace an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    TextFile,
}

impl AttachmentKind {
    /// Directory (namespace) under the media root.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::TextFile => "text_files",
        }
    }
}

/// Raw upload as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Validated (and, for images, transcoded) attachment ready for storage.
#[derive(Debug, Clone)]
pub struct ProcessedAttachment {
    pub kind: AttachmentKind,
    /// Suggested base file name; the storage collaborator makes it unique.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Pixel dimensions after processing (images only).
    pub dimensions: Option<(u32, u32)>,
}

/// Image format matching a declared content type, if it is accepted.
fn declared_format(content_type: &str) -> Option<ImageFormat> {
    match content_type {
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/gif" => Some(ImageFormat::Gif),
        _ => None,
    }
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Gif => "gif",
        _ => "png",
    }
}

/// Keep only the final path component of an uploaded file name.
///
/// Both `/` and `\` count as separators since browsers on different
/// platforms send either.
pub fn base_file_name(name: &str) -> &str {
    name.rsplit(&['/', '\\'][..]).next().unwrap_or(name).trim()
}

/// Validate, decode, resize and re-encode an image upload.
pub fn process_image(upload: Upload) -> Result<ProcessedAttachment, CommentError> {
    let content_type = upload
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .unwrap_or_default();

    let format = declared_format(&content_type)
        .ok_or_else(|| CommentError::UnsupportedMediaType(content_type.clone()))?;

    let decoded = image::load_from_memory_with_format(&upload.bytes, format)
        .map_err(|e| CommentError::InvalidImage(e.to_string()))?;

    let resized = fit_to_box(decoded);
    let dimensions = resized.dimensions();
    let bytes = encode(resized, format)?;

    let stem = base_file_name(&upload.file_name)
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or_else(|| base_file_name(&upload.file_name));
    let stem = if stem.is_empty() { DEFAULT_IMAGE_STEM } else { stem };

    Ok(ProcessedAttachment {
        kind: AttachmentKind::Image,
        file_name: format!("{stem}.{}", extension_for(format)),
        content_type,
        bytes,
        dimensions: Some(dimensions),
    })
}

/// Force an oversized image to exactly the bounding box.
fn fit_to_box(img: DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width > MAX_IMAGE_WIDTH || height > MAX_IMAGE_HEIGHT {
        img.resize_exact(MAX_IMAGE_WIDTH, MAX_IMAGE_HEIGHT, FilterType::Lanczos3)
    } else {
        img
    }
}

fn encode(img: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, CommentError> {
    // JPEG has no alpha channel; GIF frames are written from RGBA.
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img,
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .map_err(|e| CommentError::InvalidImage(e.to_string()))?;
    Ok(out.into_inner())
}

/// Validate a text-file upload and strip directory components from its name.
pub fn process_text_file(upload: Upload) -> Result<ProcessedAttachment, CommentError> {
    let name = base_file_name(&upload.file_name);

    if !name.ends_with(TEXT_FILE_EXTENSION) {
        return Err(CommentError::UnsupportedFileType(name.to_string()));
    }

    if upload.bytes.len() > MAX_TEXT_FILE_BYTES {
        return Err(CommentError::FileTooLarge {
            size: upload.bytes.len(),
            limit: MAX_TEXT_FILE_BYTES,
        });
    }

    let file_name = if name == TEXT_FILE_EXTENSION {
        DEFAULT_TEXT_FILE_NAME.to_string()
    } else {
        name.to_string()
    };

    Ok(ProcessedAttachment {
        kind: AttachmentKind::TextFile,
        file_name,
        content_type: "text/plain".to_string(),
        bytes: upload.bytes,
        dimensions: None,
    })
}
