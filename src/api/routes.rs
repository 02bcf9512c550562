/*
 * Responsibility
 * - URL structure: /health is public, the protected prefix goes through extauth
 * - The extauth layer is applied here to the protected part only
 */
use axum::{
    Router,
    routing::{any, get},
};

use crate::api::handlers::{echo::echo, health::health};
use crate::middleware;
use crate::state::AppState;

pub const HEALTH_PATH: &str = "/health";

pub fn public() -> Router<AppState> {
    Router::new().route(HEALTH_PATH, get(health))
}

/// Any method under `prefix` is handed to the echo handler once extauth
/// allows it. With `"/"` every non-public path is protected.
pub fn protected(state: AppState, prefix: &str) -> Router<AppState> {
    if prefix == "/" {
        return middleware::extauth::apply(Router::new().fallback(echo), state);
    }

    // route_layer: the default 404 fallback must stay outside the filter,
    // otherwise the merged app would consult the authority for every path.
    let router = Router::new()
        .route(prefix, any(echo))
        .route(&format!("{prefix}/{{*rest}}"), any(echo));
    middleware::extauth::apply_to_routes(router, state)
}

pub fn routes(state: AppState, prefix: &str) -> Router<AppState> {
    public().merge(protected(state, prefix))
}
