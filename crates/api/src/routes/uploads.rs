//! Route definitions for media uploads.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, post};
use axum::Router;
use storyline_core::media::MAX_AUDIO_BYTES;

use crate::handlers::media;
use crate::state::AppState;

/// Multipart overhead allowed on top of the largest accepted file.
const MULTIPART_SLACK: usize = 64 * 1024;

/// Routes mounted at `/uploads`. All require the upload token.
///
/// ```text
/// DELETE /                                  -> delete_media
/// POST   /image                             -> upload_image
/// POST   /audio                             -> upload_audio
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", delete(media::delete_media))
        .route("/image", post(media::upload_image))
        .route("/audio", post(media::upload_audio))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES + MULTIPART_SLACK))
}
