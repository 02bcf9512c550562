//! Construction of the authority check request.
//!
//! Header names and literal values are parsed once, when the filter is
//! built, so a request only has to resolve placeholders.

use axum::extract::OriginalUri;
use axum::http::{HeaderMap, HeaderName, HeaderValue, request::Parts};

use super::FilterError;
use super::config::{ConfigError, FilterConfig};

/// Values of `set-header` rules that are resolved per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `{http.request.uri}`: path and query of the incoming request.
    RequestUri,
    /// `{http.request.method}`
    RequestMethod,
}

impl Placeholder {
    /// Only an exact match is a placeholder; anything else is a literal.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "{http.request.uri}" => Some(Self::RequestUri),
            "{http.request.method}" => Some(Self::RequestMethod),
            _ => None,
        }
    }

    fn resolve(self, req: &Parts) -> String {
        match self {
            Self::RequestUri => request_uri(req).to_string(),
            Self::RequestMethod => req.method.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum SetValue {
    Literal(HeaderValue),
    Placeholder(Placeholder),
}

#[derive(Debug, Clone)]
pub(crate) struct HeaderRules {
    copy_request: Vec<HeaderName>,
    copy_response: Vec<HeaderName>,
    set: Vec<(HeaderName, SetValue)>,
}

impl HeaderRules {
    pub(crate) fn compile(config: &FilterConfig) -> Result<Self, ConfigError> {
        let copy_request = config
            .copy_request_headers
            .iter()
            .map(|name| header_name(name))
            .collect::<Result<Vec<_>, _>>()?;

        let copy_response = config
            .copy_response_headers
            .iter()
            .map(|name| header_name(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = Vec::with_capacity(config.set_headers.len());
        for (name, value) in &config.set_headers {
            let value = match Placeholder::parse(value) {
                Some(placeholder) => SetValue::Placeholder(placeholder),
                None => SetValue::Literal(HeaderValue::from_str(value).map_err(|_| {
                    ConfigError::InvalidHeaderValue {
                        name: name.clone(),
                        value: value.clone(),
                    }
                })?),
            };
            set.push((header_name(name)?, value));
        }

        Ok(Self {
            copy_request,
            copy_response,
            set,
        })
    }

    /// Headers for the authority request: the copied subset first, then the
    /// set-header rules, which replace a copied header of the same name.
    pub(crate) fn outbound_headers(&self, req: &Parts) -> Result<HeaderMap, FilterError> {
        let mut headers = HeaderMap::new();

        // A header missing from the incoming request is still sent, empty.
        for name in &self.copy_request {
            let value = req
                .headers
                .get(name)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(""));
            headers.insert(name.clone(), value);
        }

        for (name, value) in &self.set {
            let value = match value {
                SetValue::Literal(value) => value.clone(),
                SetValue::Placeholder(placeholder) => {
                    HeaderValue::from_str(&placeholder.resolve(req))
                        .map_err(|e| FilterError::Construction(Box::new(e)))?
                }
            };
            headers.insert(name.clone(), value);
        }

        Ok(headers)
    }

    /// Headers to hand back to the incoming request. Missing and empty values
    /// are skipped.
    pub(crate) fn propagated_headers(&self, response: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for name in &self.copy_response {
            if let Some(value) = response.get(name) {
                if !value.is_empty() {
                    headers.insert(name.clone(), value.clone());
                }
            }
        }
        headers
    }
}

fn header_name(name: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::InvalidHeaderName(name.to_string()))
}

/// Path and query of the request as the client sent it. Nested routers strip
/// their prefix from `Parts::uri`, so the stored `OriginalUri` wins.
pub fn request_uri(req: &Parts) -> &str {
    let uri = req
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&req.uri);

    uri.path_and_query()
        .map(|pq| pq.as_str())
        .filter(|pq| !pq.is_empty())
        .unwrap_or("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request, Uri};

    fn parts(method: Method, uri: &str) -> Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "secret")
            .header("x-forwarded-for", "10.0.0.1")
            .header("x-ignored", "nope")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn rules(config: FilterConfig) -> HeaderRules {
        HeaderRules::compile(&config).unwrap()
    }

    #[test]
    fn placeholder_requires_exact_token() {
        assert_eq!(
            Placeholder::parse("{http.request.uri}"),
            Some(Placeholder::RequestUri)
        );
        assert_eq!(
            Placeholder::parse("{http.request.method}"),
            Some(Placeholder::RequestMethod)
        );
        assert_eq!(Placeholder::parse("prefix {http.request.uri}"), None);
        assert_eq!(Placeholder::parse("{http.request.host}"), None);
    }

    #[test]
    fn copies_only_named_request_headers() {
        let rules = rules(
            FilterConfig::new("http://auth.local")
                .copy_request_header("Authorization")
                .copy_request_header("X-Forwarded-For")
                .copy_request_header("X-Missing"),
        );

        let headers = rules.outbound_headers(&parts(Method::GET, "/")).unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(headers["authorization"], "secret");
        assert_eq!(headers["x-forwarded-for"], "10.0.0.1");
        assert!(!headers.contains_key("x-ignored"));
    }

    #[test]
    fn missing_request_header_is_sent_empty() {
        let rules = rules(FilterConfig::new("http://auth.local").copy_request_header("X-Missing"));

        let headers = rules.outbound_headers(&parts(Method::GET, "/")).unwrap();

        assert_eq!(headers["x-missing"], "");
    }

    #[test]
    fn substitutes_uri_and_method() {
        let rules = rules(
            FilterConfig::new("http://auth.local")
                .set_header("X-Original-Uri", "{http.request.uri}")
                .set_header("X-Original-Method", "{http.request.method}")
                .set_header("X-Static", "fixed"),
        );

        let headers = rules
            .outbound_headers(&parts(Method::POST, "/foo?x=1"))
            .unwrap();

        assert_eq!(headers["x-original-uri"], "/foo?x=1");
        assert_eq!(headers["x-original-method"], "POST");
        assert_eq!(headers["x-static"], "fixed");
    }

    #[test]
    fn set_header_wins_over_copied_header() {
        let rules = rules(
            FilterConfig::new("http://auth.local")
                .copy_request_header("Authorization")
                .set_header("Authorization", "service-token"),
        );

        let headers = rules.outbound_headers(&parts(Method::GET, "/")).unwrap();

        assert_eq!(headers.get_all("authorization").iter().count(), 1);
        assert_eq!(headers["authorization"], "service-token");
    }

    #[test]
    fn original_uri_is_preferred_over_nested_uri() {
        let mut req = parts(Method::GET, "/users?page=2");
        req.extensions.insert(OriginalUri(Uri::from_static(
            "/api/v1/users?page=2",
        )));

        assert_eq!(request_uri(&req), "/api/v1/users?page=2");
    }

    #[test]
    fn propagates_only_named_non_empty_headers() {
        let rules = rules(
            FilterConfig::new("http://auth.local")
                .copy_response_header("X-Token")
                .copy_response_header("X-Empty")
                .copy_response_header("X-Absent"),
        );

        let mut response = HeaderMap::new();
        response.insert("x-token", HeaderValue::from_static("abc123"));
        response.insert("x-empty", HeaderValue::from_static(""));
        response.insert("x-other", HeaderValue::from_static("leak"));

        let headers = rules.propagated_headers(&response);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["x-token"], "abc123");
    }
}
