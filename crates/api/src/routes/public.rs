//! Route definitions for the public recipient read path.

use axum::routing::get;
use axum::Router;

use crate::handlers::public_story;
use crate::state::AppState;

/// Routes mounted at `/s`.
///
/// ```text
/// GET    /{slug}                            -> get_by_slug
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{slug}", get(public_story::get_by_slug))
}
