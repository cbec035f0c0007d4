//! Repository for the `chapters` table.

use sqlx::PgPool;
use storyline_core::prompt::Prompt;
use storyline_core::types::DbId;

use crate::models::chapter::{Chapter, CreateChapter, UpdateChapter};
use crate::models::story::normalize_optional;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, story_id, order_index, title, paragraph_text, image_url, \
    background_image_url, image_position, prompt_type, prompt_config, created_at, updated_at";

/// Provides CRUD operations for chapters. Every lookup is scoped to the
/// owning story.
pub struct ChapterRepo;

impl ChapterRepo {
    /// Append a chapter after the story's current last chapter.
    ///
    /// Capacity is checked by the caller; two concurrent appends are
    /// serialized by `uq_chapters_story_order`.
    pub async fn create(
        pool: &PgPool,
        story_id: DbId,
        input: &CreateChapter,
    ) -> Result<Chapter, sqlx::Error> {
        let prompt = input.prompt.clone().unwrap_or_default();
        let (prompt_type, prompt_config) = prompt.to_columns();
        let query = format!(
            "INSERT INTO chapters
                (story_id, order_index, title, paragraph_text, image_url,
                 background_image_url, image_position, prompt_type, prompt_config)
             VALUES (
                $1,
                (SELECT COALESCE(MAX(order_index) + 1, 0) FROM chapters WHERE story_id = $1),
                $2, $3, $4, $5, $6, $7, $8
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(story_id)
            .bind(normalize_optional(input.title.as_deref()))
            .bind(input.paragraph_text.as_deref().unwrap_or_default())
            .bind(normalize_optional(input.image_url.as_deref()))
            .bind(normalize_optional(input.background_image_url.as_deref()))
            .bind(input.image_position.unwrap_or_default().as_str())
            .bind(prompt_type)
            .bind(prompt_config)
            .fetch_one(pool)
            .await
    }

    /// Find a chapter of a story by ID.
    pub async fn find(
        pool: &PgPool,
        story_id: DbId,
        id: DbId,
    ) -> Result<Option<Chapter>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM chapters WHERE id = $1 AND story_id = $2");
        sqlx::query_as::<_, Chapter>(&query)
            .bind(id)
            .bind(story_id)
            .fetch_optional(pool)
            .await
    }

    /// List a story's chapters in playback order.
    pub async fn list_by_story(pool: &PgPool, story_id: DbId) -> Result<Vec<Chapter>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chapters WHERE story_id = $1 ORDER BY order_index ASC"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(story_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_story(pool: &PgPool, story_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chapters WHERE story_id = $1")
            .bind(story_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Replace every editable field of a chapter.
    ///
    /// Returns `None` if the chapter does not exist in the story.
    pub async fn update(
        pool: &PgPool,
        story_id: DbId,
        id: DbId,
        input: &UpdateChapter,
    ) -> Result<Option<Chapter>, sqlx::Error> {
        let (prompt_type, prompt_config) = Prompt::to_columns(&input.prompt);
        let query = format!(
            "UPDATE chapters SET
                title = $3,
                paragraph_text = $4,
                image_url = $5,
                background_image_url = $6,
                image_position = $7,
                prompt_type = $8,
                prompt_config = $9
             WHERE id = $1 AND story_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(id)
            .bind(story_id)
            .bind(normalize_optional(input.title.as_deref()))
            .bind(input.paragraph_text.trim())
            .bind(normalize_optional(input.image_url.as_deref()))
            .bind(normalize_optional(input.background_image_url.as_deref()))
            .bind(input.image_position.as_str())
            .bind(prompt_type)
            .bind(prompt_config)
            .fetch_optional(pool)
            .await
    }

    /// Delete a chapter of a story. Returns `true` if a row was removed.
    ///
    /// Remaining chapters keep their `order_index`; only relative order
    /// matters.
    pub async fn delete(pool: &PgPool, story_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chapters WHERE id = $1 AND story_id = $2")
            .bind(id)
            .bind(story_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
