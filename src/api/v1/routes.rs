/*
 * Responsibility
 * - v1 URL layout
 * - Public: /register-dpop-key
 * - DPoP-protected: /secure-endpoint (route_layer only touches routes merged through `protected`)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{registration::register_dpop_key, secure::secure_endpoint};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/secure-endpoint", get(secure_endpoint));
    let protected = middleware::dpop::apply(protected, state);

    Router::new()
        .route("/register-dpop-key", post(register_dpop_key))
        .merge(protected)
}
