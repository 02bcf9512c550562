/*
 * Responsibility
 * - Application-level AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Converting filter / config errors into AppError
 *
 * Denials from the authority are NOT AppErrors: they are answered with a
 * bare 401 by the extauth middleware.
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::EnvError;
use crate::filter::{ConfigError, FilterError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) | AppError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        };

        // Never leak configuration details to clients.
        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: "internal server error".into(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FilterError> for AppError {
    fn from(e: FilterError) -> Self {
        match e {
            FilterError::Construction(_) => AppError::Internal,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<EnvError> for AppError {
    fn from(e: EnvError) -> Self {
        AppError::Config(e.to_string())
    }
}
