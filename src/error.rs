/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - UpstreamError / validation error / gate の denial を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::authz::{DenialKind, DenialRecord};
use crate::services::admin::UpstreamError;

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
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthenticated: {message}")]
    Unauthenticated { message: String },
    #[error("{code}: {message}")]
    Forbidden { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("upstream error: {message}")]
    Upstream { message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::bad_request("VALIDATION_ERROR", message)
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// Translate a gate denial into the API error pipeline.
    pub fn denied(record: &DenialRecord, message: impl Into<String>) -> Self {
        match record.kind {
            DenialKind::Authentication => Self::Unauthenticated {
                message: message.into(),
            },
            DenialKind::Authorization | DenialKind::Evaluation => Self::Forbidden {
                code: record.kind.code(),
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthenticated { message } => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR", message)
            }
            AppError::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND_ERROR",
                format!("{resource} not found."),
            ),
            AppError::Conflict { message } => (StatusCode::CONFLICT, "CONFLICT_ERROR", message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotFound => AppError::not_found("resource"),
            UpstreamError::Conflict(message) => AppError::Conflict { message },
            // Upstream rejected the payload; surface its message to the caller.
            UpstreamError::Status { status: 400, message } => AppError::validation(message),
            UpstreamError::Status { status, message } => {
                tracing::error!(status, %message, "identity admin api error");
                AppError::Upstream {
                    message: "identity provider request failed".into(),
                }
            }
            UpstreamError::Token(reason) => {
                tracing::error!(%reason, "identity admin token unavailable");
                AppError::Upstream {
                    message: "identity provider unavailable".into(),
                }
            }
            UpstreamError::Transport(err) => {
                tracing::error!(error = %err, "identity admin transport error");
                AppError::Upstream {
                    message: "identity provider unavailable".into(),
                }
            }
        }
    }
}
