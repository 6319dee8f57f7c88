/*
 * Responsibility
 * - POST /register-dpop-key
 * - Json → DTO validation → KeyRecord → registry
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    api::v1::dto::registration::{RegisterKeyRequest, RegisterKeyResponse},
    error::AppError,
    services::dpop::KeyRecord,
    state::AppState,
};

pub async fn register_dpop_key(
    State(state): State<AppState>,
    body: Result<Json<RegisterKeyRequest>, JsonRejection>,
) -> Result<Json<RegisterKeyResponse>, AppError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "registration body rejected");
        AppError::bad_request("INVALID_BODY", "request body must be a JSON object")
    })?;

    let (client_id, public_key) = req.validate()?;
    let record = KeyRecord::from_json(public_key)?;
    state.dpop.register(&client_id, &record)?;

    Ok(Json(RegisterKeyResponse::registered()))
}
