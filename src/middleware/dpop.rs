//! DPoP check for protected routes.
//!
//! Reads `x-client-id` and `DPoP`, rebuilds the URL the client should have
//! signed, and verifies the proof against the client's registered key. On
//! success a `DpopCtx` is placed in the request extensions for handlers.
//!
//! Every verification failure becomes the same 401; the precise reason only
//! goes to the log.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request, Uri, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::DpopCtx;
use crate::error::AppError;
use crate::state::AppState;

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const DPOP_HEADER: &str = "dpop";

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, dpop_middleware))
}

async fn dpop_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let client_id = header_value(req.headers(), CLIENT_ID_HEADER)
        .ok_or_else(|| AppError::bad_request("MISSING_HEADER", "missing x-client-id header"))?;
    let proof = header_value(req.headers(), DPOP_HEADER)
        .ok_or_else(|| AppError::bad_request("MISSING_HEADER", "missing DPoP header"))?;

    let expected_htu =
        build_expected_htu(req.headers(), &original_uri, state.dpop.public_base_url());

    let claims = match state.dpop.verify_request(
        &client_id,
        &proof,
        req.method().as_str(),
        &expected_htu,
    ) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                client_id = %client_id,
                kind = err.kind(),
                error = %err,
                expected_htu = %expected_htu,
                "dpop verification failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(client_id = %client_id, jti = %claims.jti, "dpop proof accepted");
    req.extensions_mut().insert(DpopCtx::new(client_id, claims));

    Ok(next.run(req).await)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn build_expected_htu(headers: &HeaderMap, uri: &Uri, public_base_url: Option<&str>) -> String {
    if let Some(base) = public_base_url {
        match build_htu_from_base(base, uri) {
            Ok(url) => return url,
            Err(err) => tracing::warn!(error = %err, "PUBLIC_BASE_URL unusable, using request headers"),
        }
    }
    build_htu_from_forwarded(headers, uri)
}

fn build_htu_from_base(base: &str, uri: &Uri) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(base)?;
    url.set_path(uri.path());
    url.set_query(uri.query());
    Ok(url.to_string())
}

fn build_htu_from_forwarded(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}://{}{}", scheme, host, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn base_url_replaces_scheme_and_host() {
        let uri: Uri = "/api/v1/secure-endpoint?x=1".parse().unwrap();
        let htu = build_expected_htu(&HeaderMap::new(), &uri, Some("https://api.example.com"));
        assert_eq!(htu, "https://api.example.com/api/v1/secure-endpoint?x=1");
    }

    #[test]
    fn forwarded_headers_win_over_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8080"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("api.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        let uri: Uri = "/api/v1/secure-endpoint".parse().unwrap();

        assert_eq!(
            build_expected_htu(&headers, &uri, None),
            "https://api.example.com/api/v1/secure-endpoint"
        );
    }

    #[test]
    fn falls_back_to_host_then_localhost() {
        let uri: Uri = "/a".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(build_expected_htu(&headers, &uri, None), "http://localhost/a");

        headers.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        assert_eq!(build_expected_htu(&headers, &uri, None), "http://localhost:3000/a");
    }

    #[test]
    fn unusable_base_falls_back() {
        let uri: Uri = "/a".parse().unwrap();
        assert_eq!(
            build_expected_htu(&HeaderMap::new(), &uri, Some("not a url")),
            "http://localhost/a"
        );
    }

    #[test]
    fn blank_headers_count_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(header_value(&headers, CLIENT_ID_HEADER), None);
        assert_eq!(header_value(&headers, DPOP_HEADER), None);
    }
}
