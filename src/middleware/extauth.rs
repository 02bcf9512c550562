//! Runs the extauth filter in front of a router.
//!
//! - Allow: propagated headers are written into the request, then `next` runs.
//! - Deny: the status (401) is returned with an empty body; `next` never runs.
//! - Construction failure: 500 via `AppError`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::filter::{Decision, request::request_uri};
use crate::state::AppState;

/// Puts every route *and the fallback* of `router` behind the filter.
/// Only for a router whose fallback is itself a protected handler.
///
/// ```ignore
/// let protected = Router::new().fallback(echo);
/// let protected = middleware::extauth::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, extauth_middleware))
}

/// Puts the matched routes of `router` behind the filter. Unmatched paths
/// fall through to the default 404 without an authority call.
pub fn apply_to_routes(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, extauth_middleware))
}

async fn extauth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let decision = state.extauth.intercept(&parts).await.map_err(|err| {
        tracing::error!(url = request_uri(&parts), error = %err, "extauth filter failed");
        AppError::from(err)
    })?;

    match decision {
        Decision::Allow(_) => {
            decision.apply_to(&mut parts.headers);
            Ok(next.run(Request::from_parts(parts, body)).await)
        }
        Decision::Deny(status) => Ok(status.into_response()),
    }
}
