//! Media storage for uploaded photos
//!
//! Uploads are decoded, re-encoded as JPEG and stored content-addressed
//! (`<subdir>/<sha256>.jpg`) under the media root, so identical uploads
//! share one file. Stored paths are relative; URLs are built with the
//! configured media prefix.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use shared::error::{AppError, ErrorCode};

/// Subdirectory for retailer registration photos
pub const RETAILER_PHOTOS_DIR: &str = "retailer_photos";
/// Subdirectory for wholesale transaction receipts
pub const TRANSACTION_IMAGES_DIR: &str = "wholesale_transactions";

/// JPEG quality for stored photos
const JPEG_QUALITY: u8 = 85;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Validate an upload and re-encode it as JPEG
pub fn prepare_image(data: &[u8], file_name: Option<&str>, max_bytes: usize) -> Result<Vec<u8>, AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > max_bytes {
        return Err(AppError::new(ErrorCode::FileTooLarge)
            .with_detail("size", data.len())
            .with_detail("max_size", max_bytes));
    }

    if let Some(ext) = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
    {
        let ext = ext.to_ascii_lowercase();
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!(
                    "Unsupported file format '{ext}'. Supported: {}",
                    SUPPORTED_FORMATS.join(", ")
                ),
            ));
        }
    }

    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image: {e}"))
    })?;

    let mut buffer = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buffer), JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
        tracing::error!("Failed to encode image: {e}");
        AppError::new(ErrorCode::FileStorageFailed)
    })?;
    Ok(buffer)
}

/// Filesystem-backed media store
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
    max_bytes: usize,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Public URL for a stored relative path
    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative.trim_start_matches('/'))
    }

    /// Validate, compress and store an upload; returns the relative path.
    pub async fn store_image(
        &self,
        subdir: &'static str,
        data: Vec<u8>,
        file_name: Option<String>,
    ) -> Result<String, AppError> {
        let (relative, _) = self.store_and_report(subdir, data, file_name).await?;
        Ok(relative)
    }

    /// Start a batch of uploads that is removed again unless committed
    pub fn stage(&self) -> StagedImages<'_> {
        StagedImages {
            store: self,
            created: Vec::new(),
        }
    }

    /// Returns the relative path and whether this call created the file
    async fn store_and_report(
        &self,
        subdir: &'static str,
        data: Vec<u8>,
        file_name: Option<String>,
    ) -> Result<(String, bool), AppError> {
        let max_bytes = self.max_bytes;
        let jpeg = tokio::task::spawn_blocking(move || {
            prepare_image(&data, file_name.as_deref(), max_bytes)
        })
        .await
        .map_err(|e| AppError::internal(format!("Image task failed: {e}")))??;

        self.write_content_addressed(subdir, &jpeg).await
    }

    async fn write_content_addressed(
        &self,
        subdir: &str,
        jpeg: &[u8],
    ) -> Result<(String, bool), AppError> {
        let hash = calculate_hash(jpeg);
        let relative = format!("{subdir}/{hash}.jpg");
        let dir = self.root.join(subdir);
        let path = dir.join(format!("{hash}.jpg"));

        tokio::fs::create_dir_all(&dir).await.map_err(storage_error)?;
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        let mut file = match file {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %relative, "Duplicate image, reusing stored file");
                return Ok((relative, false));
            }
            Err(e) => return Err(storage_error(e)),
        };

        let written = async {
            file.write_all(jpeg).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(storage_error(e));
        }

        tracing::info!(path = %relative, size = jpeg.len(), "Image stored");
        Ok((relative, true))
    }
}

/// Images stored by one request.
///
/// Files this batch created are deleted by [`StagedImages::discard`];
/// files that already existed are shared with other rows and never removed.
#[derive(Debug)]
pub struct StagedImages<'a> {
    store: &'a MediaStore,
    created: Vec<PathBuf>,
}

impl StagedImages<'_> {
    pub async fn store_image(
        &mut self,
        subdir: &'static str,
        data: Vec<u8>,
        file_name: Option<String>,
    ) -> Result<String, AppError> {
        let (relative, created) = self.store.store_and_report(subdir, data, file_name).await?;
        if created {
            self.created.push(self.store.root.join(&relative));
        }
        Ok(relative)
    }

    /// Keep every stored file
    pub fn commit(self) {}

    /// Remove the files this batch created
    pub async fn discard(self) {
        for path in self.created {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Discarded staged image"),
                Err(e) => tracing::warn!(path = %path.display(), "Failed to discard staged image: {e}"),
            }
        }
    }
}

fn storage_error(e: std::io::Error) -> AppError {
    tracing::error!("Media write failed: {e}");
    AppError::new(ErrorCode::FileStorageFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([200, 30, 30])));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_prepare_converts_to_jpeg() {
        let jpeg = prepare_image(&png_bytes(), Some("toko.png"), 1024 * 1024).unwrap();
        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_prepare_rejects_bad_input() {
        assert_eq!(
            prepare_image(&[], Some("a.png"), 10).unwrap_err().code,
            ErrorCode::EmptyFile
        );
        assert_eq!(
            prepare_image(&png_bytes(), Some("a.png"), 10).unwrap_err().code,
            ErrorCode::FileTooLarge
        );
        assert_eq!(
            prepare_image(&png_bytes(), Some("a.gif"), 1 << 20)
                .unwrap_err()
                .code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            prepare_image(b"not an image", None, 1 << 20)
                .unwrap_err()
                .code,
            ErrorCode::InvalidImageFile
        );
    }

    #[tokio::test]
    async fn test_store_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media", 1 << 20);

        let first = store
            .store_image(RETAILER_PHOTOS_DIR, png_bytes(), Some("a.png".into()))
            .await
            .unwrap();
        let second = store
            .store_image(RETAILER_PHOTOS_DIR, png_bytes(), Some("b.png".into()))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("retailer_photos/"));
        assert!(first.ends_with(".jpg"));
        assert!(dir.path().join(&first).exists());
        assert_eq!(store.url(&first), format!("/media/{first}"));
    }

    fn other_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([10, 90, 200])));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_discard_keeps_files_stored_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media", 1 << 20);
        let existing = store
            .store_image(RETAILER_PHOTOS_DIR, png_bytes(), Some("a.png".into()))
            .await
            .unwrap();

        let mut staged = store.stage();
        let reused = staged
            .store_image(RETAILER_PHOTOS_DIR, png_bytes(), Some("b.png".into()))
            .await
            .unwrap();
        let fresh = staged
            .store_image(RETAILER_PHOTOS_DIR, other_png(), Some("c.png".into()))
            .await
            .unwrap();
        assert_eq!(reused, existing);
        assert!(dir.path().join(&fresh).exists());

        staged.discard().await;
        assert!(dir.path().join(&existing).exists());
        assert!(!dir.path().join(&fresh).exists());
    }

    #[tokio::test]
    async fn test_commit_keeps_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media", 1 << 20);

        let mut staged = store.stage();
        let stored = staged
            .store_image(TRANSACTION_IMAGES_DIR, png_bytes(), None)
            .await
            .unwrap();
        staged.commit();
        assert!(dir.path().join(&stored).exists());
    }
}
