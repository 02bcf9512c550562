/*
 * Responsibility
 * - Demo downstream server: dump every request it receives to stdout
 * - Reply "You are authenticated!" (it is only reachable through extauth)
 */
use anyhow::Result;
use axum::{
    Router,
    body::Bytes,
    extract::OriginalUri,
    http::{HeaderMap, Method, Version},
};

async fn dump(
    method: Method,
    OriginalUri(uri): OriginalUri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
) -> &'static str {
    let mut out = String::from("---\n");
    out.push_str(&format!("{method} {uri} {version:?}\n"));
    for (name, value) in &headers {
        out.push_str(&format!(
            "{}: {}\n",
            name,
            String::from_utf8_lossy(value.as_bytes())
        ));
    }
    out.push('\n');
    out.push_str(&String::from_utf8_lossy(&body));
    println!("{out}");

    "You are authenticated!"
}

#[tokio::main]
async fn main() -> Result<()> {
    extauth::app::init_tracing();
    dotenvy::dotenv().ok();

    let addr = std::env::var("HTTP_LOGGER_ADDR").unwrap_or_else(|_| "0.0.0.0:8001".to_string());
    let app = Router::new().fallback(dump);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("http-logger listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
