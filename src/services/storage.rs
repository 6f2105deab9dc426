use std::path::{Path, PathBuf};

use image::ImageFormat;
use uuid::Uuid;

use crate::models::upload::UploadedImage;

const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png"];
const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Filesystem-backed store for uploaded label images.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and persist an uploaded image.
    ///
    /// Both the declared content type and the filename extension must be
    /// JPEG or PNG, and the bytes must carry a JPEG or PNG signature.
    pub async fn save_upload(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<UploadedImage, StorageError> {
        let suffix = extension_of(filename);
        validate_image_type(content_type, &suffix, data)?;

        let id = Uuid::new_v4().to_string();
        let storage_key = format!("{id}{suffix}");
        tokio::fs::write(self.root.join(&storage_key), data).await?;

        tracing::debug!(
            storage_key = %storage_key,
            size_bytes = data.len(),
            "File saved"
        );

        Ok(UploadedImage {
            id,
            filename: if filename.is_empty() {
                storage_key.clone()
            } else {
                filename.to_string()
            },
            content_type: content_type.to_string(),
            storage_key,
            size_bytes: data.len(),
        })
    }

    /// Read raw image bytes by storage key.
    pub async fn read(&self, storage_key: &str) -> Result<Vec<u8>, StorageError> {
        if storage_key.is_empty()
            || storage_key.contains(['/', '\\'])
            || storage_key.starts_with('.')
        {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        match tokio::fs::read(self.root.join(storage_key)).await {
            Ok(bytes) => {
                tracing::debug!(storage_key, "Reading image bytes");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(storage_key, "Storage key not found");
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Lower-cased extension including the dot, or empty.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn validate_image_type(content_type: &str, suffix: &str, data: &[u8]) -> Result<(), StorageError> {
    if !ALLOWED_TYPES.contains(&content_type) || !ALLOWED_EXTENSIONS.contains(&suffix) {
        return Err(StorageError::InvalidType);
    }
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) | Ok(ImageFormat::Png) => Ok(()),
        _ => Err(StorageError::InvalidType),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Only JPEG and PNG files are accepted")]
    InvalidType,

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
