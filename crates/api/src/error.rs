//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, UserError};
use entity_store::EntityStoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::UnknownCommand(_) => StatusCode::NOT_FOUND,
        DomainError::NotAQuery(_) => StatusCode::BAD_REQUEST,
        DomainError::InvalidPayload { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::EntityStore(EntityStoreError::WriteConflict { .. }) => StatusCode::CONFLICT,
        DomainError::User(user_err) => match user_err {
            UserError::NotFound { .. } | UserError::DeviceNotFound { .. } => StatusCode::NOT_FOUND,
            UserError::AlreadyExists { .. } | UserError::DeviceAlreadyRegistered { .. } => {
                StatusCode::CONFLICT
            }
            UserError::NameRequired
            | UserError::StatusRequired
            | UserError::DeviceIdRequired
            | UserError::DuplicateDevice { .. } => StatusCode::BAD_REQUEST,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "internal server error");
    }

    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EntityKey;
    use entity_store::Version;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        assert_eq!(
            status_of(DomainError::UnknownCommand("Nope".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_write_conflict_is_conflict() {
        let err = DomainError::EntityStore(EntityStoreError::WriteConflict {
            key: EntityKey::new("u1"),
            expected: Version::new(1),
            actual: Version::new(2),
        });
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_user_errors_map_by_kind() {
        assert_eq!(
            status_of(DomainError::User(UserError::NameRequired)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::User(UserError::AlreadyExists {
                key: EntityKey::new("u1")
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::User(UserError::NotFound {
                key: EntityKey::new("u1")
            })),
            StatusCode::NOT_FOUND
        );
    }
}
