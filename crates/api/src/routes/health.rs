use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use storyline_core::media::MediaStore;

use crate::state::AppState;

/// Marker written and removed again to prove uploads can land.
const MEDIA_CHECK_PATH: &str = "health/write-check";

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when every dependency answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Whether the media store accepts writes.
    pub media_writable: bool,
}

async fn media_writable(media: &dyn MediaStore) -> bool {
    let result = match media.put(MEDIA_CHECK_PATH, b"ok").await {
        Ok(_) => media.delete(MEDIA_CHECK_PATH).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Media store health check failed");
    }
    result.is_ok()
}

/// GET /health -- database reachability and media store writability.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = storyline_db::health_check(&state.pool).await.is_ok();
    let media_writable = media_writable(state.media.as_ref()).await;

    Json(HealthResponse {
        status: if db_healthy && media_writable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        media_writable,
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
