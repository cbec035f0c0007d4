//! Shared-secret guard for media upload and delete endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use storyline_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

pub const UPLOAD_TOKEN_HEADER: &str = "x-upload-token";

/// Proof that the request carried the configured upload token.
///
/// ```ignore
/// async fn upload(_token: UploadToken, multipart: Multipart) -> AppResult<...> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct UploadToken;

impl FromRequestParts<AppState> for UploadToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.upload_token.as_deref() else {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Uploads are not enabled on this server".into(),
            )));
        };

        let provided = parts
            .headers
            .get(UPLOAD_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!(
                    "Missing {UPLOAD_TOKEN_HEADER} header"
                )))
            })?;

        if provided != expected {
            tracing::warn!("Rejected upload with invalid token");
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid upload token".into(),
            )));
        }
        Ok(UploadToken)
    }
}
