use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::errors::DomainError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    code: &'static str,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    /// A client error that carries its own stable code.
    Domain { status: StatusCode, code: &'static str, detail: String },
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn domain(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Self {
        Self::Domain { status, code, detail: detail.into() }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let detail = err.to_string();
        match err {
            DomainError::InvalidInput(_) => {
                Self::domain(StatusCode::BAD_REQUEST, "invalid_input", detail)
            }
            DomainError::InvalidOrder(_) => {
                Self::domain(StatusCode::BAD_REQUEST, "invalid_order", detail)
            }
            DomainError::NotFound(_) => Self::domain(StatusCode::NOT_FOUND, "not_found", detail),
            DomainError::Conflict(_) => Self::domain(StatusCode::CONFLICT, "conflict", detail),
            DomainError::AlreadyDeleted(_) => {
                Self::domain(StatusCode::CONFLICT, "already_deleted", detail)
            }
            DomainError::InvalidState(_) => {
                Self::domain(StatusCode::CONFLICT, "invalid_state", detail)
            }
            DomainError::DraftLimitExceeded { .. } => {
                Self::domain(StatusCode::FORBIDDEN, "draft_limit_exceeded", detail)
            }
            DomainError::InvalidAssetReference(_) => {
                Self::domain(StatusCode::BAD_REQUEST, "invalid_asset_reference", detail)
            }
            DomainError::AlreadyEnrolled => {
                Self::domain(StatusCode::CONFLICT, "already_enrolled", detail)
            }
            DomainError::UpstreamUnavailable(message) => Self::ServiceUnavailable(message),
            DomainError::Storage(source) => Self::internal(source, "Storage operation failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response =
                    render(StatusCode::UNAUTHORIZED, "unauthorized", message.to_string());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                render(StatusCode::FORBIDDEN, "forbidden", message.to_string())
            }
            ApiError::BadRequest(message) => {
                render(StatusCode::BAD_REQUEST, "invalid_input", message)
            }
            ApiError::Domain { status, code, detail } => render(status, code, detail),
            ApiError::ServiceUnavailable(message) => {
                tracing::error!(error = %message, "Upstream unavailable");
                render(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_unavailable",
                    "Asset storage is temporarily unavailable".to_string(),
                )
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                render(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

fn render(status: StatusCode, code: &'static str, detail: String) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), code, detail })).into_response()
}
