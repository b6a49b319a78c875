//! Image upload route

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

const MAX_IMAGE_SIZE: usize = 32 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub url: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/upload-image",
        post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE)),
    )
}

/// Forward an image to the image host
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read image data: {}", e))
        })?;

        tracing::debug!(file_name = %file_name, size = data.len(), "Uploading image");
        let url = state
            .image_host()
            .upload(&file_name, content_type.as_deref(), data.to_vec())
            .await?;
        return Ok(Json(ImageUploadResponse { url }));
    }

    Err(AppError::BadRequest("No image uploaded".to_string()))
}
