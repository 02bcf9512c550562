/*
 * Responsibility
 * - Demo authority for manual testing of extauth
 * - `Authorization: secret` => 200 + `X-Token: token`, anything else => 401
 */
use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    Router,
    extract::ConnectInfo,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

const SECRET: &str = "secret";

async fn check(ConnectInfo(peer): ConnectInfo<SocketAddr>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .is_some_and(|v| v.as_bytes() == SECRET.as_bytes());

    if authorized {
        tracing::info!(ip = %peer, "success");
        let mut response = StatusCode::OK.into_response();
        response
            .headers_mut()
            .insert("x-token", HeaderValue::from_static("token"));
        response
    } else {
        tracing::info!(ip = %peer, "fail");
        StatusCode::UNAUTHORIZED.into_response()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    extauth::app::init_tracing();
    dotenvy::dotenv().ok();

    let addr = std::env::var("DUMMY_AUTH_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let app = Router::new().fallback(check);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("dummy-auth listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
