//! Repository for the `story_completions` table.

use sqlx::types::Json;
use sqlx::PgPool;
use storyline_core::types::{Answers, DbId};

use crate::models::story_completion::StoryCompletion;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, story_id, answers, completed_at, created_at, updated_at";

/// Stores the one saved set of answers per story.
pub struct StoryCompletionRepo;

impl StoryCompletionRepo {
    /// Insert or replace the completion for a story. Last write wins.
    pub async fn upsert(
        pool: &PgPool,
        story_id: DbId,
        answers: &Answers,
    ) -> Result<StoryCompletion, sqlx::Error> {
        let query = format!(
            "INSERT INTO story_completions (story_id, answers)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_story_completions_story DO UPDATE SET
                answers = EXCLUDED.answers,
                completed_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoryCompletion>(&query)
            .bind(story_id)
            .bind(Json(answers))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_story(
        pool: &PgPool,
        story_id: DbId,
    ) -> Result<Option<StoryCompletion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_completions WHERE story_id = $1");
        sqlx::query_as::<_, StoryCompletion>(&query)
            .bind(story_id)
            .fetch_optional(pool)
            .await
    }
}
