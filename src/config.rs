/*
 * Responsibility
 * - Read process settings from the environment (PORT, APP_ENV, EXTAUTH_CONFIG ...)
 * - Fail at startup when something required is missing
 *
 * The filter itself is configured from the directive file named by
 * EXTAUTH_CONFIG (see filter::directive).
 */
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("can't read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    /// Directive file for the extauth filter.
    pub extauth_config: PathBuf,
    /// Routes under this prefix go through the filter.
    pub protected_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, EnvError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| EnvError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let extauth_config = std::env::var("EXTAUTH_CONFIG")
            .map(PathBuf::from)
            .map_err(|_| EnvError::Missing("EXTAUTH_CONFIG"))?;

        let protected_prefix = normalize_prefix(
            &std::env::var("EXTAUTH_PROTECTED_PREFIX").unwrap_or_else(|_| "/".to_string()),
        )
        .ok_or(EnvError::Invalid("EXTAUTH_PROTECTED_PREFIX"))?;

        Ok(Self {
            addr,
            app_env,
            extauth_config,
            protected_prefix,
        })
    }

    /// Contents of the directive file.
    pub fn read_extauth_directives(&self) -> Result<String, EnvError> {
        std::fs::read_to_string(&self.extauth_config).map_err(|source| EnvError::Read {
            path: self.extauth_config.clone(),
            source,
        })
    }
}

/// `"api/"` -> `"/api"`, `""` / `"/"` -> `"/"`. Rejects route parameters
/// and the public health path.
fn normalize_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.contains(['{', '}', '*']) || trimmed.split('/').next() == Some("health") {
        return None;
    }
    if trimmed.is_empty() {
        Some("/".to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}
