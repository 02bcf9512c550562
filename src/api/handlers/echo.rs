/*
 * Responsibility
 * - Downstream stand-in for protected routes
 * - Echo back what reached it (method, uri, headers) so propagated headers
 *   can be inspected
 */
use std::collections::BTreeMap;

use axum::{
    Json,
    extract::OriginalUri,
    http::{HeaderMap, Method},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoResponse {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
}

pub async fn echo(
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Json<EchoResponse> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(EchoResponse {
        method: method.to_string(),
        uri: uri.to_string(),
        headers,
    })
}
