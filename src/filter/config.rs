//! Filter configuration: the authority endpoint, the call timeout and the
//! header rules applied on the way out and on the way back.
//!
//! A `FilterConfig` is produced once (from directive text or built in code),
//! validated, and only read afterwards. Reloading means building a new one.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use super::request::HeaderRules;

/// Used when `timeout` is omitted or zero.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'endpoint' is required")]
    MissingEndpoint,

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value {value:?} for header {name:?}")]
    InvalidHeaderValue { name: String, value: String },

    #[error("line {line}: `{directive}` is not a valid extauth option")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: wrong argument count for `{directive}`")]
    ArgCount { line: usize, directive: &'static str },

    #[error("line {line}: can't parse timeout: {source}")]
    Timeout {
        line: usize,
        #[source]
        source: humantime::DurationError,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: &'static str },

    #[error("failed to build authority client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Capability: check a configuration before anything is activated with it.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub endpoint: String,
    pub timeout: Duration,
    /// Copied from the incoming request into the authority request.
    pub copy_request_headers: Vec<String>,
    /// Copied from the authority response back into the incoming request.
    pub copy_response_headers: Vec<String>,
    /// Set on the authority request after the copied headers.
    /// Keys are unique (case-insensitive); insertion order is kept.
    pub set_headers: Vec<(String, String)>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout: DEFAULT_TIMEOUT,
            copy_request_headers: Vec::new(),
            copy_response_headers: Vec::new(),
            set_headers: Vec::new(),
        }
    }
}

impl FilterConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn copy_request_header(mut self, name: impl Into<String>) -> Self {
        self.copy_request_headers.push(name.into());
        self
    }

    pub fn copy_response_header(mut self, name: impl Into<String>) -> Self {
        self.copy_response_headers.push(name.into());
        self
    }

    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_set_header(name.into(), value.into());
        self
    }

    /// Inserts a set-header rule, replacing an existing rule for the same name.
    pub fn insert_set_header(&mut self, name: String, value: String) {
        match self
            .set_headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.set_headers.push((name, value)),
        }
    }

    /// Effective timeout for one authority call.
    pub fn timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    pub(crate) fn endpoint_url(&self) -> Result<Url, ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        let url = Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        Ok(url)
    }
}

impl Validate for FilterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;
        HeaderRules::compile(self)?;
        Ok(())
    }
}
