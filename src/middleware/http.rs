//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging, one span per request tagged with its request id
//! - Global timeout, sized from the authority timeout
//!
//! Applied outside the extauth layer, so the request id already exists when
//! the filter runs and can be forwarded with `copy-request-header X-Request-Id`.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{Request, StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Headroom on top of the authority timeout for the downstream handler.
const DOWNSTREAM_BUDGET: Duration = Duration::from_secs(30);

/// Overall deadline for a request whose authority call may take `authority_timeout`.
pub fn request_timeout(authority_timeout: Duration) -> Duration {
    authority_timeout + DOWNSTREAM_BUDGET
}

fn request_span(req: &Request<Body>) -> tracing::Span {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id,
    )
}

pub fn apply(router: Router, authority_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Set before propagate: the span and the filter both see the id.
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TimeoutLayer::new(request_timeout(authority_timeout)))
        .layer(TraceLayer::new_for_http().make_span_with(request_span));

    router.layer(layers)
}
