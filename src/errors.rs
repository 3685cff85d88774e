use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::rpc::engine::EngineError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unsupported media type: {header} does not match {expected}")]
    UnsupportedMediaType {
        header: &'static str,
        expected: String,
    },
    #[error("internal error")]
    Internal { message: String },
}

/// Registration-time failures. Raised while building the router, never
/// while serving a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("JSON-RPC routes accept only GET or POST, got {0}")]
    UnsupportedMethod(String),
    #[error("route path is not routable, got {0:?}")]
    InvalidPath(String),
    #[error("media type must look like type/subtype, got {0:?}")]
    InvalidMediaType(String),
    #[error("{0} is already served by another route")]
    RouteConflict(String),
}

impl AppError {
    pub fn unsupported_media_type(header: &'static str, expected: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            header,
            expected: expected.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::UnsupportedMediaType { header, expected } => {
                tracing::warn!(header, expected = %expected, "content negotiation failed");
                StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response()
            }
            Self::Internal { message } => {
                tracing::error!(error = %message, "request failed with internal error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_has_empty_415() {
        let response =
            AppError::unsupported_media_type("content-type", "application/json").into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(response.headers().get("content-type").is_none());
    }

    #[test]
    fn engine_errors_become_internal() {
        let err = AppError::from(EngineError::CompletionDropped);
        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
