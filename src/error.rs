//! HTTP error responses.
//!
//! Handlers return `Result<impl IntoResponse, AppError>`; every variant maps
//! to one status code and a JSON [`ErrorResponse`] body.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::backend::BackendError;
use crate::identity::IdentityError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Identity lookup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Storage backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Not signed in")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code.
    pub code: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Identity(_) | Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Identity(_) => "IDENTITY_UNAVAILABLE",
            Self::Backend(_) => "BACKEND_UNAVAILABLE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Multipart(_) => "INVALID_MULTIPART",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }

        // Internal details stay in the logs.
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error,
                code: self.code(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound("uploader".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        let backend = AppError::from(BackendError::Config("missing".into()));
        assert_eq!(backend.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(backend.code(), "BACKEND_UNAVAILABLE");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = AppError::from(IdentityError::Config("secret".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
