//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use gatehouse_shared::DirectoryError;

use crate::auth::{PasswordError, SessionStoreError, StrategyError};
use crate::messages;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field is missing or empty.
    #[error("missing required field")]
    Validation,
    /// The submitted email is already registered.
    #[error("email already registered")]
    DuplicateEmail,
    /// Bad credentials. The message sent to the client never says whether
    /// the identifier or the password was at fault.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// No valid session on a request that requires one.
    #[error("authentication required")]
    NotAuthenticated,
    /// Directory or session store failure. Detail is logged server-side and
    /// never sent to the client.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation => (StatusCode::UNAUTHORIZED, messages::NON_FIELD),
            ApiError::DuplicateEmail => (StatusCode::UNAUTHORIZED, messages::DUPLICATED_EMAIL),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, messages::INVALID_CREDENTIALS)
            }
            ApiError::NotAuthenticated => (StatusCode::UNAUTHORIZED, messages::NOT_AUTH),
            ApiError::Persistence(detail) => {
                tracing::error!(detail = %detail, "persistence failure");
                (StatusCode::NOT_IMPLEMENTED, messages::SERVER_ERROR)
            }
        };

        (status, body).into_response()
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DuplicateEmail => ApiError::DuplicateEmail,
            DirectoryError::Backend(detail) => ApiError::Persistence(detail),
        }
    }
}

impl From<SessionStoreError> for ApiError {
    fn from(err: SessionStoreError) -> Self {
        ApiError::Persistence(err.to_string())
    }
}

impl From<StrategyError> for ApiError {
    fn from(err: StrategyError) -> Self {
        match err {
            StrategyError::Directory(DirectoryError::DuplicateEmail) => ApiError::DuplicateEmail,
            other => ApiError::Persistence(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Persistence(err.to_string())
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_status_and_body() {
        let resp = ApiError::InvalidCredentials.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn persistence_maps_to_501() {
        let resp = ApiError::Persistence("pool exhausted".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
