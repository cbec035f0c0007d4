//! Uploaded media: accepted types, size limits, storage paths and the
//! storage backend trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum image upload size (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Maximum audio upload size (10 MiB).
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const ACCEPTED_AUDIO_TYPES: &[&str] = &["audio/mpeg", "audio/mp4", "audio/m4a"];

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn max_bytes(self) -> usize {
        match self {
            Self::Image => MAX_IMAGE_BYTES,
            Self::Audio => MAX_AUDIO_BYTES,
        }
    }

    pub fn accepted_types(self) -> &'static [&'static str] {
        match self {
            Self::Image => ACCEPTED_IMAGE_TYPES,
            Self::Audio => ACCEPTED_AUDIO_TYPES,
        }
    }

    /// Label used in the stored file name when the client sends none.
    pub fn default_label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }

    fn default_extension(self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Audio => "mp3",
        }
    }

    /// Check the declared content type and size of an upload.
    pub fn validate_upload(self, content_type: &str, size: usize) -> Result<(), CoreError> {
        if !self.accepted_types().contains(&content_type) {
            return Err(CoreError::Validation(match self {
                Self::Image => "Invalid file type. Use JPEG, PNG, or WebP.".to_string(),
                Self::Audio => "Invalid file type. Use MP3, MP4, or M4A.".to_string(),
            }));
        }
        if size > self.max_bytes() {
            return Err(CoreError::Validation(format!(
                "File too large. Maximum {}MB.",
                self.max_bytes() / (1024 * 1024)
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Build `{story_id}/{label}-{now_ms}.{ext}` for an upload.
///
/// The extension comes from the client file name (lowercased), falling back
/// to the kind's default.
pub fn storage_path(
    kind: MediaKind,
    story_id: &str,
    label: Option<&str>,
    filename: &str,
    now_ms: i64,
) -> Result<String, CoreError> {
    if !is_safe_segment(story_id) {
        return Err(CoreError::Validation(format!("Invalid story id '{story_id}'")));
    }
    let label = label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(kind.default_label());
    if !is_safe_segment(label) {
        return Err(CoreError::Validation(format!("Invalid file label '{label}'")));
    }
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| is_safe_segment(ext))
        .unwrap_or_else(|| kind.default_extension().to_string());
    Ok(format!("{story_id}/{label}-{now_ms}.{ext}"))
}

/// Reject storage paths that are empty, absolute or escape the media root.
pub fn validate_storage_path(path: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid storage path '{path}'"));
    if path.is_empty() || path.contains('\\') {
        return Err(invalid());
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Location of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMedia {
    pub url: String,
    pub path: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<StoredMedia, CoreError>;

    /// Delete a stored file. Deleting a missing file succeeds.
    async fn delete(&self, path: &str) -> Result<(), CoreError>;

    /// Read a stored file, `None` if it does not exist.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, CoreError>;

    /// Storage path for a public URL served by this store, if it is one.
    fn path_for_url(&self, url: &str) -> Option<String>;
}

/// Stores media under a local directory, served publicly at
/// `{public_base_url}/{path}`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, CoreError> {
        validate_storage_path(path)?;
        Ok(self.root.join(path))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{path}", self.public_base_url)
    }
}

fn io_error(action: &str, path: &str, e: std::io::Error) -> CoreError {
    CoreError::Internal(format!("Failed to {action} media '{path}': {e}"))
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<StoredMedia, CoreError> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create directory for", path, e))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| io_error("write", path, e))?;
        tracing::info!(path, size = bytes.len(), "Media stored");
        Ok(StoredMedia {
            url: self.url_for(path),
            path: path.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> Result<(), CoreError> {
        let full = self.full_path(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                tracing::info!(path, "Media deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", path, e)),
        }
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let full = self.full_path(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", path, e)),
        }
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.public_base_url)?.strip_prefix('/')?;
        validate_storage_path(rest).ok()?;
        Some(rest.to_string())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn image_upload_rules() {
        assert!(MediaKind::Image.validate_upload("image/png", 1024).is_ok());
        assert!(MediaKind::Image
            .validate_upload("image/webp", MAX_IMAGE_BYTES)
            .is_ok());
        assert_matches!(
            MediaKind::Image.validate_upload("image/gif", 10),
            Err(CoreError::Validation(msg)) if msg.contains("JPEG, PNG, or WebP")
        );
        assert_matches!(
            MediaKind::Image.validate_upload("image/jpeg", MAX_IMAGE_BYTES + 1),
            Err(CoreError::Validation(msg)) if msg == "File too large. Maximum 5MB."
        );
    }

    #[test]
    fn audio_upload_rules() {
        assert!(MediaKind::Audio.validate_upload("audio/m4a", MAX_AUDIO_BYTES).is_ok());
        assert!(MediaKind::Audio.validate_upload("audio/wav", 10).is_err());
        assert!(MediaKind::Audio
            .validate_upload("audio/mpeg", MAX_AUDIO_BYTES + 1)
            .is_err());
    }

    #[test]
    fn storage_path_layout() {
        let path = storage_path(MediaKind::Image, "42", Some("chapter"), "Beach.PNG", 1700).unwrap();
        assert_eq!(path, "42/chapter-1700.png");

        let fallback = storage_path(MediaKind::Audio, "42", None, "noext", 5).unwrap();
        assert_eq!(fallback, "42/audio-5.mp3");
    }

    #[test]
    fn storage_path_rejects_unsafe_segments() {
        assert!(storage_path(MediaKind::Image, "../x", None, "a.png", 1).is_err());
        assert!(storage_path(MediaKind::Image, "42", Some("a/b"), "a.png", 1).is_err());
    }

    #[test]
    fn validate_storage_path_blocks_traversal() {
        assert!(validate_storage_path("42/image-1.png").is_ok());
        assert!(validate_storage_path("../etc/passwd").is_err());
        assert!(validate_storage_path("/abs/path").is_err());
        assert!(validate_storage_path("42/./x").is_err());
        assert!(validate_storage_path("").is_err());
    }

    #[tokio::test]
    async fn local_store_put_read_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(tmp.path(), "http://localhost:3000/media/");

        let stored = store.put("42/image-1.png", b"png-bytes").await.unwrap();
        assert_eq!(stored.url, "http://localhost:3000/media/42/image-1.png");
        assert_eq!(stored.path, "42/image-1.png");
        assert_eq!(
            store.read("42/image-1.png").await.unwrap().as_deref(),
            Some(&b"png-bytes"[..])
        );

        store.delete("42/image-1.png").await.unwrap();
        store.delete("42/image-1.png").await.unwrap();
        assert_eq!(store.read("42/image-1.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn local_store_rejects_escaping_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(tmp.path(), "http://localhost/media");
        assert!(store.put("../outside.png", b"x").await.is_err());
        assert!(store.delete("/etc/hosts").await.is_err());
    }

    #[test]
    fn maps_public_urls_back_to_paths() {
        let store = LocalMediaStore::new("/tmp/media", "http://localhost/media");
        assert_eq!(
            store.path_for_url("http://localhost/media/42/a.png").as_deref(),
            Some("42/a.png")
        );
        assert_eq!(store.path_for_url("https://cdn.test/42/a.png"), None);
        assert_eq!(store.path_for_url("http://localhost/media/../secret"), None);
    }
}
