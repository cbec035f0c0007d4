//! Story entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyline_core::error::CoreError;
use storyline_core::story::{FinalMessage, PlayableStory};
use storyline_core::types::{DbId, Timestamp};
use uuid::Uuid;
use validator::Validate;

use crate::models::chapter::Chapter;

/// A story row from the `stories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Story {
    pub id: DbId,
    pub owner_id: Uuid,
    pub title: String,
    pub slug: Option<String>,
    pub occasion: Option<String>,
    pub anniversary_number: Option<i32>,
    pub recipient_name: Option<String>,
    pub final_message_type: Option<String>,
    pub final_message_content: Option<String>,
    pub final_message_media_url: Option<String>,
    pub published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Story {
    /// Typed view of the `final_message_*` columns.
    pub fn final_message(&self) -> Result<Option<FinalMessage>, CoreError> {
        FinalMessage::from_columns(
            self.final_message_type.as_deref(),
            self.final_message_content.clone(),
            self.final_message_media_url.clone(),
        )
    }

    /// Assemble the recipient-facing story from this row and its chapters,
    /// which must already be ordered by `order_index`.
    pub fn to_playable(&self, chapters: &[Chapter]) -> Result<PlayableStory, CoreError> {
        Ok(PlayableStory {
            id: self.id.to_string(),
            title: self.title.clone(),
            recipient_name: self.recipient_name.clone(),
            occasion: self.occasion.clone(),
            final_message: self.final_message()?,
            chapters: chapters
                .iter()
                .map(Chapter::to_playable)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Dashboard listing row: a story plus its chapter count and whether a
/// recipient has saved answers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StorySummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub story: Story,
    pub chapter_count: i64,
    pub has_completion: bool,
}

/// A story with its chapters in order.
#[derive(Debug, Clone, Serialize)]
pub struct StoryWithChapters {
    #[serde(flatten)]
    pub story: Story,
    pub chapters: Vec<Chapter>,
}

/// DTO for creating a new story.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStory {
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1-100 characters"),
        custom(function = "storyline_core::validation::not_blank")
    )]
    pub title: String,
    pub occasion: Option<String>,
    #[validate(range(min = 1, max = 200, message = "Anniversary number must be 1-200"))]
    pub anniversary_number: Option<i32>,
    #[validate(length(max = 50, message = "Recipient name must be at most 50 characters"))]
    pub recipient_name: Option<String>,
}

/// DTO for updating an existing story. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateStory {
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1-100 characters"),
        custom(function = "storyline_core::validation::not_blank")
    )]
    pub title: Option<String>,
    pub occasion: Option<String>,
    #[validate(range(min = 1, max = 200, message = "Anniversary number must be 1-200"))]
    pub anniversary_number: Option<i32>,
    #[validate(length(max = 50, message = "Recipient name must be at most 50 characters"))]
    pub recipient_name: Option<String>,
}

/// DTO for setting or clearing the final message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetFinalMessage {
    #[validate(nested)]
    pub final_message: Option<FinalMessage>,
}

/// Trim free-text fields and map blanks to `None`.
pub(crate) fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
