/*
 * Responsibility
 * - Shared context handed to the router and the middleware (AppState)
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::config::AppEnv;
use crate::filter::Interceptor;

#[derive(Clone)]
pub struct AppState {
    pub app_env: AppEnv,
    pub extauth: Arc<dyn Interceptor>,
}

impl AppState {
    pub fn new(app_env: AppEnv, extauth: Arc<dyn Interceptor>) -> Self {
        Self { app_env, extauth }
    }
}
