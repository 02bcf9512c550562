/*
 * Responsibility
 * - Config loading -> filter construction -> Router assembly
 * - Middleware application (extauth on protected routes, http layers on all)
 * - Start serving with axum::serve()
 */
use std::{panic, process, sync::Arc};

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{AppEnv, Config};
use crate::error::AppError;
use crate::filter::AuthDelegationFilter;
use crate::middleware;
use crate::state::AppState;

pub fn init_tracing() {
    // RUST_LOG=info,extauth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Development aborts on panic so it is noticed immediately; production keeps
/// serving and falls back to the default hook.
fn init_panic_hook(app_env: AppEnv) {
    let abort_on_panic = !app_env.is_production();
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr may be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(config.app_env);

    let filter = AuthDelegationFilter::from_directives(&config.read_extauth_directives()?)?;
    tracing::info!(
        endpoint = %filter.config().endpoint,
        timeout = ?filter.config().timeout(),
        prefix = %config.protected_prefix,
        "starting extauth in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let app = build_app(&config, filter);
    serve(&config, app).await
}

/// Filter + routes + http layers, ready to serve.
pub fn build_app(config: &Config, filter: AuthDelegationFilter) -> Router {
    let authority_timeout = filter.config().timeout();
    let state = AppState::new(config.app_env, Arc::new(filter));

    middleware::http::apply(
        build_router(state, &config.protected_prefix),
        authority_timeout,
    )
}

pub fn build_router(state: AppState, protected_prefix: &str) -> Router {
    api::routes::routes(state.clone(), protected_prefix).with_state(state)
}

async fn serve(config: &Config, app: Router) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, addr = %config.addr, "bind failed");
            AppError::Internal
        })?;

    axum::serve(listener, app).await.map_err(|err| {
        tracing::error!(error = %err, "server error");
        AppError::Internal
    })
}
