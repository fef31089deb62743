//! The video library: listing, upload with client-side validation, removal,
//! and the download/re-upload rename pipeline, all over the blob store's
//! single `public/` namespace.

use std::sync::Arc;

use bytes::Bytes;
use jiff::Timestamp;
use tracing::info;

use crate::backend::{BackendError, BlobStore, UploadOpts};
use crate::limits::{ALLOWED_CONTENT_TYPES, MAX_UPLOAD_BYTES, MEDIA_EXTENSIONS, PALETTE_SIZE};
use crate::model::MediaRef;
use crate::observability;

/// All stored objects live directly under this prefix in the bucket.
const MEDIA_PREFIX: &str = "public";

/// Cache lifetime forwarded with every upload, in seconds.
const CACHE_CONTROL_SECS: u32 = 3600;

/// Media failures, coded like the schedule errors so the UI can show
/// stable messages. V001/V002 fire before any collaborator call.
#[derive(Debug)]
pub enum MediaError {
    /// V001: content type is not MP4 or QuickTime.
    UnsupportedFormat,
    /// V002: payload exceeds the 200 MiB ceiling.
    TooLarge,
    /// V003: the upload call itself failed.
    Upload(BackendError),
    /// V004: the rename pipeline (download, re-upload, remove) failed.
    Processing(BackendError),
    /// V006: listing the library failed.
    ListFailed(BackendError),
    /// V007: removing an object failed.
    RemoveFailed(BackendError),
}

impl MediaError {
    pub fn code(&self) -> &'static str {
        match self {
            MediaError::UnsupportedFormat => "V001",
            MediaError::TooLarge => "V002",
            MediaError::Upload(_) => "V003",
            MediaError::Processing(_) => "V004",
            MediaError::ListFailed(_) => "V006",
            MediaError::RemoveFailed(_) => "V007",
        }
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::UnsupportedFormat => {
                write!(f, "V001: unsupported file format, only MP4 and MOV are allowed")
            }
            MediaError::TooLarge => write!(f, "V002: file size exceeds the 200 MiB limit"),
            MediaError::Upload(e) => write!(f, "V003: upload failed: {e}"),
            MediaError::Processing(e) => write!(f, "V004: video processing error: {e}"),
            MediaError::ListFailed(e) => write!(f, "V006: failed to list videos: {e}"),
            MediaError::RemoveFailed(e) => write!(f, "V007: video deletion failed: {e}"),
        }
    }
}

impl std::error::Error for MediaError {}

/// Make a filename safe for the object store: whitespace runs become
/// underscores, the Swedish vowels map to their ASCII base letters, and
/// anything else outside `[A-Za-z0-9._-]` is dropped.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        match c {
            'å' | 'ä' => out.push('a'),
            'ö' => out.push('o'),
            'Å' | 'Ä' => out.push('A'),
            'Ö' => out.push('O'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => out.push(c),
            _ => {}
        }
    }
    out
}

/// Deterministic palette index for calendar rendering: strip the
/// millisecond upload prefix (everything up to the first `-`), sum the
/// remaining code points, mod the palette size. Display-only.
pub fn color_index(stored_name: &str) -> u32 {
    let base = match stored_name.split_once('-') {
        Some((_, rest)) => rest,
        None => stored_name,
    };
    let sum: u32 = base.chars().map(|c| c as u32).fold(0, u32::wrapping_add);
    sum % PALETTE_SIZE
}

fn has_media_extension(name: &str) -> bool {
    MEDIA_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn object_path(name: &str) -> String {
    format!("{MEDIA_PREFIX}/{name}")
}

fn upload_opts(content_type: &str) -> UploadOpts {
    UploadOpts {
        content_type: content_type.to_string(),
        cache_control: Some(CACHE_CONTROL_SECS),
        upsert: false,
    }
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".mov") {
        "video/quicktime"
    } else {
        "video/mp4"
    }
}

fn now_ms() -> i64 {
    Timestamp::now().as_millisecond()
}

pub struct MediaLibrary {
    blobs: Arc<dyn BlobStore>,
}

impl MediaLibrary {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Every playable video in the library with its public URL: the set
    /// the calendar offers for scheduling.
    pub async fn list(&self) -> Result<Vec<MediaRef>, MediaError> {
        let objects = self
            .blobs
            .list(MEDIA_PREFIX)
            .await
            .map_err(MediaError::ListFailed)?;
        Ok(objects
            .into_iter()
            .filter(|o| has_media_extension(&o.name))
            .map(|o| MediaRef {
                url: self.blobs.public_url(&object_path(&o.name)),
                name: o.name,
            })
            .collect())
    }

    /// Validate, sanitize, and store a video. Returns the stored object
    /// name (millisecond-prefixed to dodge collisions). Type and size are
    /// rejected before the collaborator is ever called.
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, MediaError> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            metrics::counter!(observability::UPLOADS_REJECTED_TOTAL, "reason" => "format")
                .increment(1);
            return Err(MediaError::UnsupportedFormat);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            metrics::counter!(observability::UPLOADS_REJECTED_TOTAL, "reason" => "size")
                .increment(1);
            return Err(MediaError::TooLarge);
        }

        let stored = format!("{}-{}", now_ms(), sanitize_filename(filename));
        self.blobs
            .upload(&object_path(&stored), bytes, &upload_opts(content_type))
            .await
            .map_err(MediaError::Upload)?;
        metrics::counter!(observability::UPLOADS_TOTAL).increment(1);
        info!(name = %stored, "video uploaded");
        Ok(stored)
    }

    pub async fn remove(&self, name: &str) -> Result<(), MediaError> {
        self.blobs
            .remove(&[object_path(name)])
            .await
            .map_err(MediaError::RemoveFailed)?;
        info!(name = %name, "video removed");
        Ok(())
    }

    /// Rename by copy: download the object, upload it under the new name,
    /// then remove the old one. A failure part-way leaves the original in
    /// place (and, after a successful re-upload, possibly both copies),
    /// reported as V004, never rolled back.
    pub async fn rename(&self, old: &str, new: &str) -> Result<(), MediaError> {
        let bytes = self
            .blobs
            .download(&object_path(old))
            .await
            .map_err(MediaError::Processing)?;
        self.blobs
            .upload(&object_path(new), bytes, &upload_opts(content_type_for(new)))
            .await
            .map_err(MediaError::Processing)?;
        self.blobs
            .remove(&[object_path(old)])
            .await
            .map_err(MediaError::Processing)?;
        info!(from = %old, to = %new, "video renamed");
        Ok(())
    }
}
