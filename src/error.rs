//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no config registered for resource '{0}'")]
    MissingResource(String),
    #[error("duplicate config for resource '{0}'")]
    DuplicateResource(String),
    #[error("resource '{resource}': {detail}")]
    InvalidEntry { resource: String, detail: String },
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),
    #[error("invalid setting {name}: {detail}")]
    InvalidSetting { name: &'static str, detail: String },
}

/// Failure categories surfaced by the data adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownResource,
    UnsupportedOperation,
    NotFound,
    ValidationFailed,
    BackendUnavailable,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnknownResource => "unknown_resource",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::BackendUnavailable => "backend_unavailable",
        }
    }

    /// Configuration bugs rather than user-facing conditions.
    pub fn is_config_bug(self) -> bool {
        matches!(self, ErrorKind::UnknownResource | ErrorKind::UnsupportedOperation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} ({resource}): {detail}")]
pub struct AdapterError {
    pub kind: ErrorKind,
    pub resource: String,
    pub detail: String,
}

impl AdapterError {
    pub fn new(kind: ErrorKind, resource: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            resource: resource.into(),
            detail: detail.into(),
        }
    }

    pub fn unknown_resource(name: &str) -> Self {
        Self::new(ErrorKind::UnknownResource, name, "no resource registered under this name")
    }

    pub fn unsupported(resource: impl Into<String>, operation: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedOperation,
            resource,
            format!("{} not configured", operation),
        )
    }

    pub fn not_found(resource: impl Into<String>, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, resource, format!("no record '{}'", id))
    }

    pub fn validation(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, resource, detail)
    }
}

/// Errors raised by a backend client before the adapter classifies them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected: {message}")]
    Rejected {
        message: String,
        data: Option<serde_json::Value>,
    },
}

impl BackendError {
    pub fn into_adapter(self, resource: &str) -> AdapterError {
        match self {
            BackendError::Unavailable(detail) => {
                AdapterError::new(ErrorKind::BackendUnavailable, resource, detail)
            }
            BackendError::NotFound(detail) => AdapterError::new(ErrorKind::NotFound, resource, detail),
            BackendError::Rejected { message, .. } => {
                AdapterError::new(ErrorKind::ValidationFailed, resource, message)
            }
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub resource: String,
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ErrorKind::UnknownResource => StatusCode::NOT_FOUND,
            ErrorKind::UnsupportedOperation => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        if self.kind.is_config_bug() {
            tracing::error!(resource = %self.resource, kind = %self.kind, detail = %self.detail, "configuration bug");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.kind.code().to_string(),
                message: self.detail,
                resource: self.resource,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_to_adapter_kinds() {
        let e = BackendError::Unavailable("connection refused".into()).into_adapter("faqs");
        assert_eq!(e.kind, ErrorKind::BackendUnavailable);
        assert_eq!(e.resource, "faqs");

        let e = BackendError::Rejected {
            message: "ArgumentValidationError".into(),
            data: None,
        }
        .into_adapter("leads");
        assert_eq!(e.kind, ErrorKind::ValidationFailed);

        let e = BackendError::NotFound("gone".into()).into_adapter("services");
        assert_eq!(e.kind, ErrorKind::NotFound);
    }

    #[test]
    fn response_status_follows_kind() {
        let resp = AdapterError::unsupported("leads", "create").into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let resp = AdapterError::not_found("faqs", "abc").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
