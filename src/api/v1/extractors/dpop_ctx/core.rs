use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

use super::DpopCtx;

/// Pulls the `DpopCtx` the middleware stored in the request extensions.
/// Missing means the route was not wired behind the middleware: 401.
pub struct DpopCtxExtractor(pub DpopCtx);

impl FromRequestParts<AppState> for DpopCtxExtractor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<DpopCtx>()
            .cloned()
            .map(DpopCtxExtractor)
            .ok_or(AppError::Unauthorized)
    }
}
