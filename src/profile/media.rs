use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::ValidationError;
use crate::Result;

const KILOBYTE: u64 = 1024;
const MEGABYTE: u64 = 1024 * KILOBYTE;

pub const MAX_MEDIA_BYTES: u64 = 5 * MEGABYTE;
pub const ALLOWED_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Where an uploaded image ends up on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MediaSlot {
    Photo,
    CompanyLogo,
}

impl MediaSlot {
    /// Multipart field name used by the profile endpoint.
    pub fn field_name(&self) -> &'static str {
        match self {
            MediaSlot::Photo => "photo",
            MediaSlot::CompanyLogo => "company_logo",
        }
    }
}

impl fmt::Display for MediaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// An image picked by the user, held in memory until it is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, guessing its type from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_owned();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        let content_type = match extension.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        };
        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Every rule the file breaks, in a stable order.
    pub fn violations(&self) -> Vec<ValidationError> {
        let mut violations = Vec::new();
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_MEDIA_TYPES.contains(&content_type.as_str()) {
            violations.push(ValidationError::UnsupportedMediaType(
                self.content_type.clone(),
            ));
        }
        if self.size() > MAX_MEDIA_BYTES {
            violations.push(ValidationError::MediaTooLarge {
                size: self.size(),
                max: MAX_MEDIA_BYTES,
            });
        }
        violations
    }
}

/// Hands out local preview references for pending images and keeps track
/// of the ones still alive.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_id: AtomicU64,
    live: Mutex<BTreeSet<u64>>,
    released: AtomicU64,
}

impl PreviewRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn create(self: &Arc<Self>, slot: MediaSlot) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        log::trace!("preview: created {} for {}", id, slot);
        PreviewHandle {
            id,
            uri: format!("preview://{}/{}", slot, id),
            registry: Arc::clone(self),
        }
    }

    /// Number of previews created and not yet released.
    pub fn live_count(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    fn release(&self, id: u64) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if removed {
            self.released.fetch_add(1, Ordering::Relaxed);
            log::trace!("preview: released {}", id);
        } else {
            log::error!("preview: {} released twice", id);
        }
    }
}

/// A local preview reference. It is released exactly once, when the
/// handle is dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    uri: String,
    registry: Arc<PreviewRegistry>,
}

impl PreviewHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

/// A validated file waiting for the next save, with its preview.
#[derive(Debug)]
pub struct PendingUpload {
    pub file: MediaFile,
    pub preview: PreviewHandle,
}
