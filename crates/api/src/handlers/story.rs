//! Handlers for the `/stories` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyline_core::types::{DbId, DEFAULT_OWNER_ID};
use storyline_db::models::story::{
    CreateStory, SetFinalMessage, Story, StorySummary, StoryWithChapters, UpdateStory,
};
use storyline_db::repositories::{ChapterRepo, StoryRepo};
use storyline_db::DbPool;
use validator::Validate;

use crate::error::{not_found, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a story owned by the default owner, or 404.
pub(crate) async fn find_story(pool: &DbPool, id: DbId) -> AppResult<Story> {
    StoryRepo::find_by_id(pool, id)
        .await?
        .filter(|story| story.owner_id == DEFAULT_OWNER_ID)
        .ok_or(not_found("Story", id))
}

/// POST /api/v1/stories
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateStory>,
) -> AppResult<(StatusCode, Json<DataResponse<Story>>)> {
    input.validate()?;
    let story = StoryRepo::create(&state.pool, DEFAULT_OWNER_ID, &input).await?;
    tracing::info!(story_id = story.id, "Story created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: story })))
}

/// GET /api/v1/stories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<StorySummary>>>> {
    let stories = StoryRepo::list_for_owner(&state.pool, DEFAULT_OWNER_ID).await?;
    Ok(Json(DataResponse { data: stories }))
}

/// GET /api/v1/stories/{id}
///
/// Returns the story with its chapters in order.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StoryWithChapters>>> {
    let story = find_story(&state.pool, id).await?;
    let chapters = ChapterRepo::list_by_story(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: StoryWithChapters { story, chapters },
    }))
}

/// PUT /api/v1/stories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStory>,
) -> AppResult<Json<DataResponse<Story>>> {
    input.validate()?;
    find_story(&state.pool, id).await?;
    let story = StoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(not_found("Story", id))?;
    Ok(Json(DataResponse { data: story }))
}

/// PUT /api/v1/stories/{id}/final-message
///
/// A `null` final message clears it, which also blocks publishing.
pub async fn set_final_message(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetFinalMessage>,
) -> AppResult<Json<DataResponse<Story>>> {
    input.validate()?;
    find_story(&state.pool, id).await?;
    let story = StoryRepo::set_final_message(&state.pool, id, input.final_message.as_ref())
        .await?
        .ok_or(not_found("Story", id))?;
    Ok(Json(DataResponse { data: story }))
}

/// DELETE /api/v1/stories/{id}
///
/// Chapters and the saved completion go with it.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    find_story(&state.pool, id).await?;
    if StoryRepo::delete(&state.pool, id).await? {
        tracing::info!(story_id = id, "Story deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Story", id))
    }
}
