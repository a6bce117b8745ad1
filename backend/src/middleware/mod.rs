//! General-purpose middleware for the HTTP surface.

use axum::{
    body::Body,
    http::{header::HOST, Request},
    Router,
};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info_span, Level, Span};

/// Wraps `router` in a request span carrying method, path and host, with
/// responses logged at info.
pub fn with_http_trace(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(request_span)
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

fn request_span(request: &Request<Body>) -> Span {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    info_span!(
        "http",
        method = %request.method(),
        path = %request.uri().path(),
        host,
    )
}
