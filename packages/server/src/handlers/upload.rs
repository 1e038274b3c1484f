use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::StoredImage;
use tracing::{instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::ApiResponse;
use crate::state::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// Room for multipart framing on top of the configured image size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn image_upload_body_limit(max_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

/// Read the `image` field of a multipart body and hand it to the image store.
pub(crate) async fn store_image_field(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<StoredImage, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue; // Ignore unknown fields.
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Image field must have a filename".into()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
        return Ok(state.image_store.put(&file_name, &data).await?);
    }
    Err(AppError::Validation(format!("Missing '{IMAGE_FIELD}' field")))
}

/// Remove an image whose owning row could not be written.
pub(crate) async fn discard_image(state: &AppState, image: &StoredImage) {
    if let Err(e) = state.image_store.delete(&image.path).await {
        warn!(path = %image.path, error = %e, "Failed to remove orphaned upload");
    }
}

#[utoipa::path(
    post,
    path = "/images",
    tag = "Uploads",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Stores the `image` multipart field and returns its relative path, for use in \
        avatar, logo or banner fields. Only image types are accepted.",
    request_body(content_type = "multipart/form-data", description = "Image file in the `image` field"),
    responses(
        (status = 201, description = "Image stored; data is its relative path", body = ApiResponse<String>),
        (status = 400, description = "Missing field, non-image or oversize file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let image = store_image_field(&state, &mut multipart).await?;
    tracing::info!(path = %image.path, size = image.size, "Image uploaded");
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(image.path, "Image uploaded successfully"),
    ))
}
