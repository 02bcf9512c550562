/*
 * Responsibility
 * - Decide, per request, whether it may proceed by asking an external authority
 * - One GET to the authority per request, bounded by the configured timeout
 * - 200 => Allow (with headers to propagate), anything else => Deny(401)
 */
pub mod config;
pub mod directive;
pub mod request;

use std::sync::Arc;

use async_trait::async_trait;
use axum::BoxError;
use axum::http::{HeaderMap, StatusCode, request::Parts};
use thiserror::Error;
use url::Url;

pub use config::{ConfigError, DEFAULT_TIMEOUT, FilterConfig, Validate};
pub use request::Placeholder;

use request::{HeaderRules, request_uri};

/// Outcome of one authority call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed; the headers are written into the incoming request first.
    Allow(HeaderMap),
    /// Respond with this status and stop.
    Deny(StatusCode),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// Writes propagated headers into `headers`, replacing same-named ones.
    /// Does nothing for `Deny`.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        if let Self::Allow(propagated) = self {
            for (name, value) in propagated {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
}

/// The authority request could not be built. Indicates a configuration
/// defect, so the host should fail the request instead of retrying it.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to construct authority request: {0}")]
    Construction(#[source] BoxError),
}

/// Capability: decide a single incoming request.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, req: &Parts) -> Result<Decision, FilterError>;
}

struct Inner {
    config: FilterConfig,
    endpoint: Url,
    rules: HeaderRules,
    client: reqwest::Client,
}

/// Delegates the allow/deny decision for a request to the configured
/// authority endpoint.
///
/// Cheap to clone; clones share the configuration and the connection pool.
#[derive(Clone)]
pub struct AuthDelegationFilter {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AuthDelegationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthDelegationFilter")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("timeout", &self.inner.config.timeout())
            .finish()
    }
}

impl AuthDelegationFilter {
    /// Validates `config` and provisions the authority client.
    pub fn new(config: FilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let endpoint = config.endpoint_url()?;
        let rules = HeaderRules::compile(&config)?;

        // The authority is called directly, never through an environment proxy.
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .no_proxy()
            .build()
            .map_err(ConfigError::Client)?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                endpoint,
                rules,
                client,
            }),
        })
    }

    /// Parses directive text and builds the filter from it.
    pub fn from_directives(text: &str) -> Result<Self, ConfigError> {
        Self::new(text.parse()?)
    }

    pub fn config(&self) -> &FilterConfig {
        &self.inner.config
    }

    fn build_request(&self, req: &Parts) -> Result<reqwest::Request, FilterError> {
        let headers = self.inner.rules.outbound_headers(req)?;

        self.inner
            .client
            .get(self.inner.endpoint.clone())
            .headers(headers)
            .build()
            .map_err(|e| FilterError::Construction(Box::new(e)))
    }
}

#[async_trait]
impl Interceptor for AuthDelegationFilter {
    async fn intercept(&self, req: &Parts) -> Result<Decision, FilterError> {
        let url = request_uri(req);
        let auth_req = self.build_request(req)?;

        tracing::debug!(
            url,
            endpoint = %self.inner.endpoint,
            "sending authority request"
        );

        let response = match self.inner.client.execute(auth_req).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url, error = %err, "failed to authenticate");
                return Ok(Decision::Deny(StatusCode::UNAUTHORIZED));
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(
                url,
                status = response.status().as_u16(),
                "failed to authenticate"
            );
            return Ok(Decision::Deny(StatusCode::UNAUTHORIZED));
        }

        tracing::info!(url, "successfully authenticated");

        // The body is never read; dropping the response releases the connection.
        Ok(Decision::Allow(
            self.inner.rules.propagated_headers(response.headers()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    #[test]
    fn apply_overwrites_existing_headers() {
        let mut propagated = HeaderMap::new();
        propagated.insert("x-token", HeaderValue::from_static("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_static("forged"));
        headers.append("x-token", HeaderValue::from_static("forged-again"));
        headers.insert("accept", HeaderValue::from_static("*/*"));

        Decision::Allow(propagated).apply_to(&mut headers);

        assert_eq!(headers.get_all("x-token").iter().count(), 1);
        assert_eq!(headers["x-token"], "abc123");
        assert_eq!(headers["accept"], "*/*");
    }

    #[test]
    fn deny_leaves_headers_untouched() {
        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_static("forged"));

        let decision = Decision::Deny(StatusCode::UNAUTHORIZED);
        decision.apply_to(&mut headers);

        assert!(!decision.is_allow());
        assert_eq!(headers["x-token"], "forged");
    }

    #[test]
    fn new_rejects_missing_endpoint() {
        let err = AuthDelegationFilter::new(FilterConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEndpoint));
    }

    #[test]
    fn new_runs_full_validation() {
        let err = AuthDelegationFilter::new(
            FilterConfig::new("http://auth.local/check").set_header("X-Static", "a\r\nb"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeaderValue { .. }));

        let err = AuthDelegationFilter::new(FilterConfig::new("mailto:auth@local")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn builds_get_request_without_body() {
        let filter = AuthDelegationFilter::new(
            FilterConfig::new("http://auth.local/check")
                .copy_request_header("Authorization")
                .set_header("X-Original-Method", "{http.request.method}"),
        )
        .unwrap();

        let (parts, _) = Request::builder()
            .method("PUT")
            .uri("/items/7")
            .header("authorization", "secret")
            .body(())
            .unwrap()
            .into_parts();

        let auth_req = filter.build_request(&parts).unwrap();

        assert_eq!(auth_req.method(), reqwest::Method::GET);
        assert_eq!(auth_req.url().as_str(), "http://auth.local/check");
        assert!(auth_req.body().is_none());
        assert_eq!(auth_req.headers()["authorization"], "secret");
        assert_eq!(auth_req.headers()["x-original-method"], "PUT");
    }
}
