use std::sync::Arc;

use storyline_core::media::MediaStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: storyline_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Where uploaded media lives.
    pub media: Arc<dyn MediaStore>,
    /// Outbound client for fetching remote chapter images during export.
    pub http: reqwest::Client,
}
