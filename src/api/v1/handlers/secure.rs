/*
 * Responsibility
 * - GET /secure-endpoint (behind the DPoP middleware)
 */
use axum::Json;

use crate::api::v1::{dto::secure::SecureResponse, extractors::DpopCtxExtractor};

pub async fn secure_endpoint(DpopCtxExtractor(ctx): DpopCtxExtractor) -> Json<SecureResponse> {
    Json(SecureResponse {
        message: "DPoP proof verified",
        client_id: ctx.client_id,
        claims: ctx.claims,
    })
}
