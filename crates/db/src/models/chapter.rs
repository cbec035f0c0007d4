//! Chapter entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyline_core::error::CoreError;
use storyline_core::prompt::Prompt;
use storyline_core::story::{ImagePosition, PlayableChapter};
use storyline_core::types::{DbId, Timestamp};
use validator::Validate;

/// A chapter row from the `chapters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Chapter {
    pub id: DbId,
    pub story_id: DbId,
    pub order_index: i32,
    pub title: Option<String>,
    pub paragraph_text: String,
    pub image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub image_position: String,
    pub prompt_type: String,
    pub prompt_config: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Chapter {
    pub fn prompt(&self) -> Result<Prompt, CoreError> {
        Prompt::from_columns(&self.prompt_type, self.prompt_config.clone())
    }

    pub fn image_position(&self) -> ImagePosition {
        ImagePosition::from_name(&self.image_position)
    }

    pub fn to_playable(&self) -> Result<PlayableChapter, CoreError> {
        Ok(PlayableChapter {
            id: self.id.to_string(),
            title: self.title.clone(),
            paragraph_text: self.paragraph_text.clone(),
            image_url: self.image_url.clone(),
            image_position: self.image_position(),
            prompt: self.prompt()?,
        })
    }
}

/// DTO for creating a new chapter.
///
/// The chapter is appended after the story's last chapter. Paragraph text
/// may start empty; the editor form fills it in later.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateChapter {
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Paragraph must be at most 2000 characters"))]
    pub paragraph_text: Option<String>,
    #[validate(custom(function = "storyline_core::validation::empty_or_url"))]
    pub image_url: Option<String>,
    #[validate(custom(function = "storyline_core::validation::empty_or_url"))]
    pub background_image_url: Option<String>,
    pub image_position: Option<ImagePosition>,
    #[validate(nested)]
    pub prompt: Option<Prompt>,
}

/// DTO for saving the chapter editor form. Replaces every field; switching
/// the prompt type discards the previous prompt configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateChapter {
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 2000, message = "Paragraph must be 1-2000 characters"),
        custom(function = "storyline_core::validation::not_blank")
    )]
    pub paragraph_text: String,
    #[validate(custom(function = "storyline_core::validation::empty_or_url"))]
    pub image_url: Option<String>,
    #[validate(custom(function = "storyline_core::validation::empty_or_url"))]
    pub background_image_url: Option<String>,
    #[serde(default)]
    pub image_position: ImagePosition,
    #[serde(default)]
    #[validate(nested)]
    pub prompt: Prompt,
}
