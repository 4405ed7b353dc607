//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::course_info::{CourseDetailsError, CourseInfoError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Missing or empty user header
    Unauthorized(String),
    /// Repository error
    Repository(RepositoryError),
    /// Course-info collaborator failure
    CourseInfo(CourseInfoError),
}

fn repository_response(err: RepositoryError) -> (StatusCode, ApiError) {
    let (status, code) = match &err {
        RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        RepositoryError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        RepositoryError::ConflictError { .. } => (StatusCode::CONFLICT, "CONFLICT"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR"),
    };

    let mut body = ApiError::new(code, err.message());
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Repository failure: {}", err);
        body = body.with_details(err.context().to_string());
    }
    (status, body)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", msg))
            }
            AppError::Repository(e) => repository_response(e),
            AppError::CourseInfo(e) => {
                log::warn!("Course info failure: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError::new("COURSE_INFO_UNAVAILABLE", e.to_string()),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<CourseDetailsError> for AppError {
    fn from(err: CourseDetailsError) -> Self {
        match err {
            CourseDetailsError::Repository(e) => AppError::Repository(e),
            CourseDetailsError::CourseInfo(e) => AppError::CourseInfo(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_repository_error_statuses() {
        assert_eq!(
            status_of(RepositoryError::not_found("gone").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepositoryError::validation("bad").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::conflict("taken").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RepositoryError::connection("down").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_other_statuses() {
        assert_eq!(
            status_of(AppError::Unauthorized("who?".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::CourseInfo(CourseInfoError::NotConfigured)),
            StatusCode::BAD_GATEWAY
        );
    }
}
