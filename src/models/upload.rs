use serde::{Deserialize, Serialize};

/// Metadata for a stored label image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedImage {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub storage_key: String,
    pub size_bytes: usize,
}
