//! Story completion entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use storyline_core::types::{Answers, DbId, Timestamp};

/// A completion row from the `story_completions` table. One per story.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryCompletion {
    pub id: DbId,
    pub story_id: DbId,
    pub answers: Json<Answers>,
    pub completed_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for saving a recipient's answers.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveCompletion {
    pub answers: Answers,
}
