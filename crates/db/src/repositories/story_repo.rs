//! Repository for the `stories` table.

use sqlx::PgPool;
use storyline_core::story::FinalMessage;
use storyline_core::types::DbId;
use uuid::Uuid;

use crate::models::story::{normalize_optional, CreateStory, Story, StorySummary, UpdateStory};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, title, slug, occasion, anniversary_number, recipient_name, \
    final_message_type, final_message_content, final_message_media_url, published, \
    created_at, updated_at";

/// Same columns qualified with the `s` alias, for joins.
const S_COLUMNS: &str = "s.id, s.owner_id, s.title, s.slug, s.occasion, s.anniversary_number, \
    s.recipient_name, s.final_message_type, s.final_message_content, \
    s.final_message_media_url, s.published, s.created_at, s.updated_at";

/// Provides CRUD and publishing operations for stories.
pub struct StoryRepo;

impl StoryRepo {
    /// Insert a new unpublished story, returning the created row.
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        input: &CreateStory,
    ) -> Result<Story, sqlx::Error> {
        let query = format!(
            "INSERT INTO stories (owner_id, title, occasion, anniversary_number, recipient_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(owner_id)
            .bind(input.title.trim())
            .bind(normalize_optional(input.occasion.as_deref()))
            .bind(input.anniversary_number)
            .bind(normalize_optional(input.recipient_name.as_deref()))
            .fetch_one(pool)
            .await
    }

    /// Find a story by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a published story by its public slug. Unpublished stories are
    /// invisible here even if they still hold a slug.
    pub async fn find_published_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE slug = $1 AND published");
        sqlx::query_as::<_, Story>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's stories, most recently updated first, with chapter
    /// counts and completion flags.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<StorySummary>, sqlx::Error> {
        let query = format!(
            "SELECT {S_COLUMNS},
                (SELECT COUNT(*) FROM chapters c WHERE c.story_id = s.id) AS chapter_count,
                EXISTS (SELECT 1 FROM story_completions sc WHERE sc.story_id = s.id)
                    AS has_completion
             FROM stories s
             WHERE s.owner_id = $1
             ORDER BY s.updated_at DESC, s.id DESC"
        );
        sqlx::query_as::<_, StorySummary>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Update a story. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStory,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET
                title = COALESCE($2, title),
                occasion = COALESCE($3, occasion),
                anniversary_number = COALESCE($4, anniversary_number),
                recipient_name = COALESCE($5, recipient_name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(normalize_optional(input.occasion.as_deref()))
            .bind(input.anniversary_number)
            .bind(normalize_optional(input.recipient_name.as_deref()))
            .fetch_optional(pool)
            .await
    }

    /// Replace the final message columns; `None` clears them.
    pub async fn set_final_message(
        pool: &PgPool,
        id: DbId,
        message: Option<&FinalMessage>,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET
                final_message_type = $2,
                final_message_content = $3,
                final_message_media_url = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(message.map(FinalMessage::type_name))
            .bind(message.and_then(FinalMessage::content))
            .bind(message.and_then(FinalMessage::media_url))
            .fetch_optional(pool)
            .await
    }

    /// Mark a story published under `slug`.
    ///
    /// Fails with a unique violation on `uq_stories_slug` if the slug is
    /// taken; callers retry with a fresh slug.
    pub async fn publish(
        pool: &PgPool,
        id: DbId,
        slug: &str,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET published = TRUE, slug = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Clear the published flag. The slug is kept.
    pub async fn unpublish(pool: &PgPool, id: DbId) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET published = FALSE
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a story and, through cascades, its chapters and completion.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
