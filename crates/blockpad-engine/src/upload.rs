//! Image uploads for image blocks.
//!
//! HEIC/HEIF photos (the iPhone default) cannot be displayed by most
//! renderers, so they must pass through a [`Transcoder`] to JPEG first.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("The file is empty")]
    Empty,
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Image is {size} bytes, the limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("Could not convert image: {0}")]
    Transcode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
}

#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, UploadError>;
}

/// Converts HEIC/HEIF bytes to JPEG
pub trait Transcoder: Send + Sync {
    fn to_jpeg(&self, heic: &[u8]) -> Result<Vec<u8>, UploadError>;
}

const HEIF_BRANDS: [&[u8; 4]; 9] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"hevs", b"mif1",
];

/// Whether an upload is HEIC/HEIF, by content type, extension or file header
pub fn is_heic(image: &ImageUpload) -> bool {
    let by_type = image
        .content_type
        .as_deref()
        .is_some_and(|t| matches!(t.to_ascii_lowercase().as_str(), "image/heic" | "image/heif"));
    let by_extension = extension(&image.file_name)
        .is_some_and(|ext| ext == "heic" || ext == "heif");
    let by_header = image.bytes.len() >= 12
        && &image.bytes[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| &image.bytes[8..12] == brand.as_slice());
    by_type || by_extension || by_header
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Stores uploads as files in a directory and hands out `file://` URLs
pub struct FileSystemUploader {
    dir: PathBuf,
    transcoder: Option<Box<dyn Transcoder>>,
    max_bytes: usize,
}

impl FileSystemUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            transcoder: None,
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_transcoder(mut self, transcoder: Box<dyn Transcoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Bytes and file extension to store
    fn prepare(&self, image: ImageUpload) -> Result<(Vec<u8>, String), UploadError> {
        if image.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if is_heic(&image) {
            let transcoder = self
                .transcoder
                .as_ref()
                .ok_or_else(|| UploadError::UnsupportedFormat("HEIC".to_string()))?;
            log::debug!("transcoding {} to JPEG", image.file_name);
            return Ok((transcoder.to_jpeg(&image.bytes)?, "jpg".to_string()));
        }
        let ext = extension(&image.file_name).unwrap_or_else(|| "bin".to_string());
        Ok((image.bytes, ext))
    }
}

#[async_trait]
impl ImageUploader for FileSystemUploader {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, UploadError> {
        let (bytes, ext) = self.prepare(image)?;
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.{ext}", Uuid::new_v4()));
        fs::write(&path, &bytes)?;
        log::info!("stored upload at {}", path.display());
        Ok(UploadedImage {
            url: format!("file://{}", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FakeJpeg;

    impl Transcoder for FakeJpeg {
        fn to_jpeg(&self, _heic: &[u8]) -> Result<Vec<u8>, UploadError> {
            Ok(vec![0xFF, 0xD8, 0xFF])
        }
    }

    fn upload(name: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: None,
            bytes: bytes.to_vec(),
        }
    }

    fn heic_header() -> Vec<u8> {
        let mut bytes = vec![0, 0, 0, 24];
        bytes.extend_from_slice(b"ftypheic");
        bytes.extend_from_slice(&[0; 8]);
        bytes
    }

    #[test]
    fn test_heic_detection() {
        assert!(is_heic(&upload("IMG_0001.HEIC", b"x")));
        assert!(is_heic(&upload("photo", &heic_header())));
        assert!(is_heic(&ImageUpload {
            content_type: Some("image/heif".into()),
            ..upload("photo", b"x")
        }));
        assert!(!is_heic(&upload("cat.png", b"\x89PNG\r\n\x1a\n0000")));
    }

    #[tokio::test]
    async fn test_upload_writes_file() {
        let dir = TempDir::new().unwrap();
        let uploader = FileSystemUploader::new(dir.path());

        let uploaded = uploader.upload(upload("cat.PNG", b"png-bytes")).await.unwrap();

        let path = uploaded.url.strip_prefix("file://").unwrap();
        assert!(path.ends_with(".png"));
        assert_eq!(fs::read(path).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_heic_without_transcoder_is_rejected() {
        let dir = TempDir::new().unwrap();
        let uploader = FileSystemUploader::new(dir.path());
        let result = uploader.upload(upload("IMG.heic", &heic_header())).await;
        assert!(matches!(result, Err(UploadError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_heic_is_transcoded_to_jpeg() {
        let dir = TempDir::new().unwrap();
        let uploader = FileSystemUploader::new(dir.path()).with_transcoder(Box::new(FakeJpeg));

        let uploaded = uploader.upload(upload("IMG.heic", &heic_header())).await.unwrap();

        let path = uploaded.url.strip_prefix("file://").unwrap();
        assert!(path.ends_with(".jpg"));
        assert_eq!(fs::read(path).unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_empty_and_oversized_uploads_are_rejected() {
        let dir = TempDir::new().unwrap();
        let uploader = FileSystemUploader::new(dir.path()).with_max_bytes(4);

        assert!(matches!(
            uploader.upload(upload("a.png", b"")).await,
            Err(UploadError::Empty)
        ));
        assert!(matches!(
            uploader.upload(upload("a.png", b"too big")).await,
            Err(UploadError::TooLarge { size: 7, limit: 4 })
        ));
    }
}
