use axum::extract::{Multipart, State};
use axum::Json;

use crate::app_state::AppState;
use crate::models::upload::UploadedImage;
use crate::routes::error::ApiError;

/// Multipart part name carrying label images.
pub const FILES_FIELD: &str = "files";

/// POST /upload — store one or more label images (JPEG or PNG).
pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadedImage>>, ApiError> {
    let mut results = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::ValidationRejected(e.body_text()))?
    {
        if field.name() != Some(FILES_FIELD) {
            tracing::debug!(field = ?field.name(), "Skipping multipart part");
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::ValidationRejected(e.body_text()))?;

        match state.storage.save_upload(&filename, &content_type, &data).await {
            Ok(saved) => {
                tracing::info!(
                    file_id = %saved.id,
                    filename = %saved.filename,
                    content_type = %saved.content_type,
                    size_bytes = saved.size_bytes,
                    "Upload stored"
                );
                results.push(saved);
            }
            Err(e) => {
                tracing::warn!(
                    filename = %filename,
                    content_type = %content_type,
                    error = %e,
                    "Upload rejected"
                );
                return Err(e.into());
            }
        }
    }

    if results.is_empty() {
        return Err(ApiError::ValidationRejected("No files provided".to_string()));
    }
    Ok(Json(results))
}
