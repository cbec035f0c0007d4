//! Media upload and delete handlers. All require the upload token.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use storyline_core::media::{storage_path, validate_storage_path, MediaKind, StoredMedia};
use storyline_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::handlers::story::find_story;
use crate::middleware::upload_token::UploadToken;
use crate::response::DataResponse;
use crate::state::AppState;

/// Fields collected from an upload form.
struct UploadForm {
    filename: String,
    content_type: String,
    data: Vec<u8>,
    story_id: DbId,
    label: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut story_id: Option<String> = None;
    let mut label: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, content_type, data.to_vec()));
            }
            "storyId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                story_id = Some(text);
            }
            "fileType" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                label = Some(text);
            }
            _ => {} // ignore unknown fields
        }
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;
    let story_id = story_id
        .ok_or_else(|| AppError::BadRequest("Story ID is required".into()))?
        .trim()
        .parse::<DbId>()
        .map_err(|_| AppError::BadRequest("Story ID must be numeric".into()))?;

    Ok(UploadForm {
        filename,
        content_type,
        data,
        story_id,
        label,
    })
}

async fn upload(state: &AppState, kind: MediaKind, multipart: Multipart) -> AppResult<StoredMedia> {
    let form = read_form(multipart).await?;
    kind.validate_upload(&form.content_type, form.data.len())?;
    find_story(&state.pool, form.story_id).await?;

    let path = storage_path(
        kind,
        &form.story_id.to_string(),
        form.label.as_deref(),
        &form.filename,
        chrono::Utc::now().timestamp_millis(),
    )?;
    let stored = state.media.put(&path, &form.data).await?;
    tracing::info!(
        story_id = form.story_id,
        kind = ?kind,
        size = form.data.len(),
        path = %stored.path,
        "Media uploaded",
    );
    Ok(stored)
}

/// POST /api/v1/uploads/image
///
/// Multipart fields: `file`, `storyId`, optional `fileType` label.
pub async fn upload_image(
    _token: UploadToken,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<StoredMedia>>)> {
    let stored = upload(&state, MediaKind::Image, multipart).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: stored })))
}

/// POST /api/v1/uploads/audio
pub async fn upload_audio(
    _token: UploadToken,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<StoredMedia>>)> {
    let stored = upload(&state, MediaKind::Audio, multipart).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: stored })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteMedia {
    pub path: String,
}

/// DELETE /api/v1/uploads
///
/// Deleting a file that is already gone succeeds.
pub async fn delete_media(
    _token: UploadToken,
    State(state): State<AppState>,
    Json(input): Json<DeleteMedia>,
) -> AppResult<StatusCode> {
    validate_storage_path(&input.path)?;
    state.media.delete(&input.path).await?;
    Ok(StatusCode::NO_CONTENT)
}
