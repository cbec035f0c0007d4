//! Saving and reading a recipient's completed pass.

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::Json;
use storyline_core::completion::{validate_answers, CompletionSink};
use storyline_core::error::CoreError;
use storyline_core::types::{Answers, DbId};
use storyline_db::models::story_completion::{SaveCompletion, StoryCompletion};
use storyline_db::repositories::{ChapterRepo, StoryCompletionRepo, StoryRepo};
use storyline_db::DbPool;

use crate::error::{not_found, AppResult};
use crate::handlers::story::find_story;
use crate::response::DataResponse;
use crate::state::AppState;

/// Completion sink backed by the `story_completions` table.
///
/// Only published stories accept completions, and every answer must name
/// one of the story's chapters.
pub struct PgCompletionSink {
    pool: DbPool,
}

impl PgCompletionSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("Failed to save completion: {e}"))
}

#[async_trait]
impl CompletionSink for PgCompletionSink {
    async fn save_completion(&self, story_id: &str, answers: &Answers) -> Result<(), CoreError> {
        let id: DbId = story_id
            .parse()
            .map_err(|_| CoreError::Validation(format!("Invalid story id '{story_id}'")))?;

        let story = StoryRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)?
            .ok_or(CoreError::NotFound { entity: "Story", id })?;
        if !story.published {
            return Err(CoreError::Conflict(
                "Only published stories can be completed".into(),
            ));
        }

        let chapters = ChapterRepo::list_by_story(&self.pool, id)
            .await
            .map_err(db_error)?;
        let chapter_ids: Vec<String> = chapters.iter().map(|c| c.id.to_string()).collect();
        validate_answers(answers, chapter_ids.iter().map(String::as_str))?;

        StoryCompletionRepo::upsert(&self.pool, id, answers)
            .await
            .map_err(db_error)?;
        tracing::info!(story_id = id, answers = answers.len(), "Completion saved");
        Ok(())
    }
}

/// PUT /api/v1/stories/{id}/completion
///
/// Upsert; saving again replaces the previous answers.
pub async fn save_completion(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SaveCompletion>,
) -> AppResult<Json<DataResponse<StoryCompletion>>> {
    let sink = PgCompletionSink::new(state.pool.clone());
    sink.save_completion(&id.to_string(), &input.answers).await?;

    let completion = StoryCompletionRepo::find_by_story(&state.pool, id)
        .await?
        .ok_or(not_found("StoryCompletion", id))?;
    Ok(Json(DataResponse { data: completion }))
}

/// GET /api/v1/stories/{id}/completion
pub async fn get_completion(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<StoryCompletion>>>> {
    find_story(&state.pool, id).await?;
    let completion = StoryCompletionRepo::find_by_story(&state.pool, id).await?;
    Ok(Json(DataResponse { data: completion }))
}
