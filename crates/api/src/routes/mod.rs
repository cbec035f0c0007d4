pub mod health;
pub mod public;
pub mod story;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /stories                                  list, create
/// /stories/{id}                             get, update, delete
/// /stories/{id}/final-message               set final message (PUT)
/// /stories/{id}/publish                     publish (POST)
/// /stories/{id}/unpublish                   unpublish (POST)
/// /stories/{id}/completion                  get, upsert (PUT)
/// /stories/{id}/export                      zip of chapter snapshots (?aspect=)
/// /stories/{story_id}/chapters              list, create
/// /stories/{story_id}/chapters/{id}         get, update, delete
///
/// /s/{slug}                                 public playable story
///
/// /uploads                                  delete stored file (token)
/// /uploads/image                            upload image (multipart, token)
/// /uploads/audio                            upload audio (multipart, token)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/stories", story::router())
        .nest("/s", public::router())
        .nest("/uploads", uploads::router())
}
