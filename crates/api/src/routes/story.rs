//! Route definitions for the `/stories` resource.
//!
//! Also nests chapter routes under `/stories/{story_id}/chapters`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{chapter, completion, export, publish, story};
use crate::state::AppState;

/// Routes mounted at `/stories`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
/// PUT    /{id}/final-message                -> set_final_message
/// POST   /{id}/publish                      -> publish
/// POST   /{id}/unpublish                    -> unpublish
/// GET    /{id}/completion                   -> get_completion
/// PUT    /{id}/completion                   -> save_completion
/// GET    /{id}/export                       -> export_snapshots
///
/// GET    /{story_id}/chapters               -> list_by_story
/// POST   /{story_id}/chapters               -> create
/// GET    /{story_id}/chapters/{id}          -> get_by_id
/// PUT    /{story_id}/chapters/{id}          -> update
/// DELETE /{story_id}/chapters/{id}          -> delete
/// ```
pub fn router() -> Router<AppState> {
    let chapter_routes = Router::new()
        .route("/", get(chapter::list_by_story).post(chapter::create))
        .route(
            "/{id}",
            get(chapter::get_by_id)
                .put(chapter::update)
                .delete(chapter::delete),
        );

    Router::new()
        .route("/", get(story::list).post(story::create))
        .route(
            "/{id}",
            get(story::get_by_id).put(story::update).delete(story::delete),
        )
        .route("/{id}/final-message", put(story::set_final_message))
        .route("/{id}/publish", post(publish::publish))
        .route("/{id}/unpublish", post(publish::unpublish))
        .route(
            "/{id}/completion",
            get(completion::get_completion).put(completion::save_completion),
        )
        .route("/{id}/export", get(export::export_snapshots))
        .nest("/{story_id}/chapters", chapter_routes)
}
