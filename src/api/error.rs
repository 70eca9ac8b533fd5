use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ErrorResponse;
use crate::services::{AliasError, AuthError, UserError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    /// Always rendered with a generic message; the detail is for logs only.
    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    UpstreamError(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::UpstreamError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: error_message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
            AuthError::MissingToken => {
                ApiError::Unauthorized("Authorization token required".into())
            }
            // Unknown, replaced, revoked and expired tokens look the same.
            AuthError::InvalidToken | AuthError::SessionExpired => {
                ApiError::Unauthorized("Invalid token".into())
            }
            AuthError::IncorrectPassword => ApiError::Unauthorized("Invalid old password".into()),
            AuthError::UsernameTaken => ApiError::validation("Username already exists"),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => ApiError::not_found("User", id),
            UserError::UsernameTaken => ApiError::validation("Username already exists"),
            UserError::CannotDeleteSelf => {
                ApiError::validation("Administrators cannot delete their own account")
            }
            UserError::Validation(msg) => ApiError::ValidationError(msg),
            UserError::Database(msg) => ApiError::DatabaseError(msg),
            UserError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AliasError> for ApiError {
    fn from(err: AliasError) -> Self {
        match err {
            AliasError::TokenNotFound(id) => ApiError::not_found("Token", id),
            AliasError::AddressNotFound(id) => ApiError::not_found("Address", id),
            AliasError::Validation(msg) => ApiError::ValidationError(msg),
            // Provider detail is logged by the service, never echoed.
            AliasError::Upstream(_) => {
                ApiError::UpstreamError("Failed to generate email address".into())
            }
            AliasError::Database(msg) => ApiError::DatabaseError(msg),
            AliasError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ProviderError;

    #[test]
    fn credential_failures_share_one_shape() {
        let wrong_password = ApiError::from(AuthError::InvalidCredentials);
        let unknown_user = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(
            wrong_password.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn token_failures_are_indistinguishable() {
        let invalid = ApiError::from(AuthError::InvalidToken).to_string();
        let expired = ApiError::from(AuthError::SessionExpired).to_string();
        assert_eq!(invalid, expired);
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (ApiError::validation("x"), StatusCode::BAD_REQUEST),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("User", 3), StatusCode::NOT_FOUND),
            (
                ApiError::from(AuthError::UsernameTaken),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(AliasError::Upstream(ProviderError::NoAddress {
                    status: 401,
                    body: "{\"error\":\"bad token\"}".into(),
                })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::InternalError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn upstream_body_is_not_exposed() {
        let error = ApiError::from(AliasError::Upstream(ProviderError::NoAddress {
            status: 500,
            body: "secret provider detail".into(),
        }));
        assert!(!error.to_string().contains("secret provider detail"));
    }
}
