//! Acting-user extraction.
//!
//! Authentication happens in the front proxy, which forwards the logged-in
//! username in [`USER_HEADER`].

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::AppError;

/// Header carrying the authenticated username.
pub const USER_HEADER: &str = "x-planner-user";

/// Username of the student making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", USER_HEADER)))?;

        let username = value
            .to_str()
            .map_err(|_| AppError::Unauthorized(format!("Malformed {} header", USER_HEADER)))?
            .trim();
        if username.is_empty() {
            return Err(AppError::Unauthorized(format!("Empty {} header", USER_HEADER)));
        }

        Ok(CurrentUser(username.to_string()))
    }
}
