//! Public recipient read path.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use storyline_core::story::PlayableStory;
use storyline_core::types::{Answers, Timestamp};
use storyline_db::models::chapter::Chapter;
use storyline_db::models::story::Story;
use storyline_db::repositories::{ChapterRepo, StoryCompletionRepo, StoryRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// A saved pass, as the player needs it for resume.
#[derive(Debug, Serialize)]
pub struct PublicCompletion {
    pub answers: Answers,
    pub completed_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct PublicStory {
    pub story: PlayableStory,
    pub completion: Option<PublicCompletion>,
}

/// Build the playable story from stored rows. Rows that no longer parse are
/// a server-side fault, not a client error.
pub(crate) fn playable(story: &Story, chapters: &[Chapter]) -> AppResult<PlayableStory> {
    story.to_playable(chapters).map_err(|e| {
        AppError::InternalError(format!("Story {} has invalid stored data: {e}", story.id))
    })
}

/// GET /api/v1/s/{slug}
///
/// Unpublished, unknown and chapterless stories all read as not found.
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<PublicStory>>> {
    let missing = || AppError::NotFound(format!("No story at '{slug}'"));

    let story = StoryRepo::find_published_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(missing)?;
    let chapters = ChapterRepo::list_by_story(&state.pool, story.id).await?;
    if chapters.is_empty() {
        return Err(missing());
    }

    let completion = StoryCompletionRepo::find_by_story(&state.pool, story.id)
        .await?
        .map(|c| PublicCompletion {
            answers: c.answers.0,
            completed_at: c.completed_at,
        });

    Ok(Json(DataResponse {
        data: PublicStory {
            story: playable(&story, &chapters)?,
            completion,
        },
    }))
}
