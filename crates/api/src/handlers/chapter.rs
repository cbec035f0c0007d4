//! Handlers for chapters nested under `/stories/{story_id}/chapters`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyline_core::story::validate_chapter_capacity;
use storyline_core::types::DbId;
use storyline_db::models::chapter::{Chapter, CreateChapter, UpdateChapter};
use storyline_db::repositories::ChapterRepo;
use validator::Validate;

use crate::error::{not_found, AppResult};
use crate::handlers::story::find_story;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/stories/{story_id}/chapters
///
/// Appends a chapter; rejected once the story holds the maximum.
pub async fn create(
    State(state): State<AppState>,
    Path(story_id): Path<DbId>,
    Json(input): Json<CreateChapter>,
) -> AppResult<(StatusCode, Json<DataResponse<Chapter>>)> {
    input.validate()?;
    find_story(&state.pool, story_id).await?;

    let existing = ChapterRepo::count_by_story(&state.pool, story_id).await?;
    validate_chapter_capacity(usize::try_from(existing).unwrap_or(usize::MAX))?;

    let chapter = ChapterRepo::create(&state.pool, story_id, &input).await?;
    tracing::info!(story_id, chapter_id = chapter.id, order_index = chapter.order_index, "Chapter created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: chapter })))
}

/// GET /api/v1/stories/{story_id}/chapters
pub async fn list_by_story(
    State(state): State<AppState>,
    Path(story_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Chapter>>>> {
    find_story(&state.pool, story_id).await?;
    let chapters = ChapterRepo::list_by_story(&state.pool, story_id).await?;
    Ok(Json(DataResponse { data: chapters }))
}

/// GET /api/v1/stories/{story_id}/chapters/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((story_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Chapter>>> {
    find_story(&state.pool, story_id).await?;
    let chapter = ChapterRepo::find(&state.pool, story_id, id)
        .await?
        .ok_or(not_found("Chapter", id))?;
    Ok(Json(DataResponse { data: chapter }))
}

/// PUT /api/v1/stories/{story_id}/chapters/{id}
///
/// Saves the whole editor form. Field errors come back keyed by path, e.g.
/// `prompt.options`.
pub async fn update(
    State(state): State<AppState>,
    Path((story_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateChapter>,
) -> AppResult<Json<DataResponse<Chapter>>> {
    input.validate()?;
    find_story(&state.pool, story_id).await?;
    let chapter = ChapterRepo::update(&state.pool, story_id, id, &input)
        .await?
        .ok_or(not_found("Chapter", id))?;
    tracing::debug!(story_id, chapter_id = id, prompt_type = %chapter.prompt_type, "Chapter saved");
    Ok(Json(DataResponse { data: chapter }))
}

/// DELETE /api/v1/stories/{story_id}/chapters/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path((story_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_story(&state.pool, story_id).await?;
    if ChapterRepo::delete(&state.pool, story_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Chapter", id))
    }
}
