//! Chapter snapshot export as a zip archive.

use std::io::{Cursor, Write};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use storyline_core::export::{build_snapshots, ChapterSnapshot, ExportError, ImageSource, SnapshotAspect};
use storyline_core::media::MediaStore;
use storyline_core::types::{Answers, DbId};
use storyline_db::repositories::{ChapterRepo, StoryCompletionRepo};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, AppResult};
use crate::handlers::public_story::playable;
use crate::handlers::story::find_story;
use crate::state::AppState;

/// Loads chapter images from the local media store when the URL points at
/// it, and over HTTP otherwise.
pub struct StoryImageSource {
    media: Arc<dyn MediaStore>,
    http: reqwest::Client,
}

impl StoryImageSource {
    pub fn new(media: Arc<dyn MediaStore>, http: reqwest::Client) -> Self {
        Self { media, http }
    }
}

#[async_trait]
impl ImageSource for StoryImageSource {
    async fn load(&self, url: &str) -> Result<Vec<u8>, ExportError> {
        let fail = |reason: String| ExportError::ImageLoad {
            url: url.to_string(),
            reason,
        };

        if let Some(path) = self.media.path_for_url(url) {
            return self
                .media
                .read(&path)
                .await
                .map_err(|e| fail(e.to_string()))?
                .ok_or_else(|| fail("not found in media store".into()));
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fail(e.to_string()))?;
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// `portrait` (9:16, default) or `square` (1:1).
    pub aspect: Option<String>,
}

/// Pack snapshots into a zip of `chapter-N.png` entries. PNG data is
/// already compressed, so entries are stored as-is.
pub fn zip_snapshots(snapshots: &[ChapterSnapshot]) -> Result<Vec<u8>, zip::result::ZipError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for snapshot in snapshots {
        writer.start_file(snapshot.file_name(), options)?;
        writer.write_all(&snapshot.png)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// GET /api/v1/stories/{id}/export?aspect=
///
/// One card per chapter, filled with the saved completion's answers when
/// there is one. Chapter images that fail to load leave a text-only card.
pub async fn export_snapshots(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let aspect = match params.aspect.as_deref() {
        None => SnapshotAspect::default(),
        Some(name) => SnapshotAspect::from_name(name).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown aspect '{name}'. Use 'portrait' (9:16) or 'square' (1:1)"
            ))
        })?,
    };

    let story = find_story(&state.pool, id).await?;
    let chapters = ChapterRepo::list_by_story(&state.pool, id).await?;
    if chapters.is_empty() {
        return Err(AppError::BadRequest("Story has no chapters to export".into()));
    }
    let playable = playable(&story, &chapters)?;
    let answers: Answers = StoryCompletionRepo::find_by_story(&state.pool, id)
        .await?
        .map(|c| c.answers.0)
        .unwrap_or_default();

    let images = StoryImageSource::new(Arc::clone(&state.media), state.http.clone());
    let snapshots = build_snapshots(&playable, &answers, aspect, &images)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let archive = zip_snapshots(&snapshots).map_err(|e| AppError::InternalError(e.to_string()))?;

    tracing::info!(story_id = id, cards = snapshots.len(), bytes = archive.len(), "Export built");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"story-{id}-snapshots.zip\""),
            ),
        ],
        archive,
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn zip_contains_one_entry_per_snapshot() {
        let snapshots: Vec<ChapterSnapshot> = (0..3)
            .map(|index| ChapterSnapshot {
                index,
                chapter_id: format!("c{index}"),
                png: vec![index as u8; 4],
                image_included: false,
            })
            .collect();

        let bytes = zip_snapshots(&snapshots).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut second = archive.by_name("chapter-2.png").unwrap();
        let mut data = Vec::new();
        second.read_to_end(&mut data).unwrap();
        assert_eq!(data, vec![1u8; 4]);
    }
}
