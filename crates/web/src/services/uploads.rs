//! Store photo uploads.
//!
//! Photos are written as-is under a random name into the upload directory
//! and served from `/uploads/{filename}`. Only raster formats browsers render
//! inertly are accepted; SVG can carry script and is refused.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when saving an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Content type is not one of the accepted raster formats.
    #[error("That filetype is not allowed!")]
    NotAnImage(String),

    /// Writing the file failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded photos to disk.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Create a photo store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory photos are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Save `bytes` and return the generated filename.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NotAnImage` unless `content_type` is JPEG, PNG, GIF or WebP.
    /// Returns `UploadError::Io` if the file cannot be written.
    pub async fn save(&self, bytes: &[u8], content_type: &str) -> Result<String, UploadError> {
        let extension = image_extension(content_type)
            .ok_or_else(|| UploadError::NotAnImage(content_type.to_owned()))?;

        let filename = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        tracing::debug!(%filename, size = bytes.len(), "Photo stored");
        Ok(filename)
    }
}

/// File extension for an accepted photo content type, e.g. `image/png` -> `png`.
fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match essence.strip_prefix("image/")? {
        "jpeg" | "jpg" | "pjpeg" => Some("jpeg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), Some("jpeg"));
        assert_eq!(image_extension("image/jpg"), Some("jpeg"));
        assert_eq!(image_extension("IMAGE/PNG; charset=binary"), Some("png"));
        assert_eq!(image_extension("image/webp"), Some("webp"));
        assert_eq!(image_extension("image/svg+xml"), None);
        assert_eq!(image_extension("image/x-icon"), None);
        assert_eq!(image_extension("text/html"), None);
        assert_eq!(image_extension("image/"), None);
        assert_eq!(image_extension("image/../etc"), None);
    }

    #[tokio::test]
    async fn test_save_writes_file_with_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let photos = PhotoStore::new(dir.path());

        let filename = photos.save(b"GIF89a", "image/gif").await.unwrap();
        assert!(filename.ends_with(".gif"));
        assert_eq!(filename.len(), 36 + ".gif".len());

        let written = std::fs::read(dir.path().join(&filename)).unwrap();
        assert_eq!(written, b"GIF89a");
    }

    #[tokio::test]
    async fn test_save_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let photos = PhotoStore::new(dir.path());

        let err = photos.save(b"<html>", "text/html").await.unwrap_err();
        assert_eq!(err.to_string(), "That filetype is not allowed!");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_save_rejects_svg() {
        let dir = tempfile::tempdir().unwrap();
        let photos = PhotoStore::new(dir.path());

        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
        let err = photos.save(svg, "image/svg+xml").await.unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(ref t) if t == "image/svg+xml"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let photos = PhotoStore::new(dir.path().join("a/b"));
        photos.ensure_dir().await.unwrap();
        assert!(photos.dir().is_dir());
    }
}
