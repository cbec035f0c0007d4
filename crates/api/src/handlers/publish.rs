//! Publishing: readiness checks and public slug assignment.

use axum::extract::{Path, State};
use axum::Json;
use storyline_core::error::CoreError;
use storyline_core::slug::{generate_slug, MAX_SLUG_ATTEMPTS};
use storyline_core::story::check_publishable;
use storyline_core::types::DbId;
use storyline_db::models::story::Story;
use storyline_db::repositories::{ChapterRepo, StoryRepo};

use crate::error::{is_unique_violation, not_found, AppError, AppResult};
use crate::handlers::story::find_story;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/stories/{id}/publish
///
/// Requires at least one chapter, paragraph text on every chapter and a
/// final message. An unpublished story gets a fresh slug; publishing an
/// already published story returns it unchanged.
pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Story>>> {
    let story = find_story(&state.pool, id).await?;
    if story.published {
        return Ok(Json(DataResponse { data: story }));
    }

    let chapters = ChapterRepo::list_by_story(&state.pool, id).await?;
    let final_message = story.final_message()?;
    check_publishable(
        chapters.iter().map(|c| c.paragraph_text.as_str()),
        final_message.as_ref(),
    )?;

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = generate_slug(&story.title);
        match StoryRepo::publish(&state.pool, id, &slug).await {
            Ok(Some(published)) => {
                tracing::info!(story_id = id, slug = %slug, "Story published");
                return Ok(Json(DataResponse { data: published }));
            }
            Ok(None) => return Err(not_found("Story", id)),
            Err(e) if is_unique_violation(&e, "uq_stories_slug") => {
                tracing::warn!(story_id = id, attempt, slug = %slug, "Slug collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Core(CoreError::Conflict(
        "Could not generate a unique link for this story, please try again".into(),
    )))
}

/// POST /api/v1/stories/{id}/unpublish
///
/// Hides the story from its public link. The slug is kept.
pub async fn unpublish(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Story>>> {
    find_story(&state.pool, id).await?;
    let story = StoryRepo::unpublish(&state.pool, id)
        .await?
        .ok_or(not_found("Story", id))?;
    tracing::info!(story_id = id, "Story unpublished");
    Ok(Json(DataResponse { data: story }))
}
