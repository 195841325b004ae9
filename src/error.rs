//! Error types for Choreboard.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Authorization errors for the household gate and the parent gate.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Parent access required")]
    ParentRequired,

    #[error("Locked. Try again in {retry_after_seconds} seconds")]
    Locked { retry_after_seconds: i64 },
}

/// Request-payload validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Chore title must not be empty")]
    EmptyTitle,

    #[error("Unknown child: {0}")]
    UnknownChild(String),

    #[error("Day part only applies to daily chores")]
    DayPartOnWeekly,

    #[error("Threshold {name} must be between 0 and 1, got {value}")]
    ThresholdOutOfRange { name: String, value: f64 },

    #[error("Trophy threshold must not be below apple threshold")]
    ThresholdOrder,

    #[error("Reorder list must not be empty")]
    EmptyReorder,
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Auth(AuthError::Locked { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            // Locked responses carry the remaining wait so the UI can count down.
            Error::Auth(AuthError::Locked {
                retry_after_seconds,
            }) => json!({
                "error": "locked",
                "retry_after_seconds": retry_after_seconds,
            }),
            // Denials use a stable token the web client keys on.
            Error::Auth(AuthError::Unauthorized | AuthError::ParentRequired) => {
                json!({ "error": "unauthorized" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let locked = Error::Auth(AuthError::Locked {
            retry_after_seconds: 120,
        });
        assert_eq!(locked.status(), StatusCode::TOO_MANY_REQUESTS);

        let missing = Error::Database(DatabaseError::NotFound {
            entity: "chore".into(),
            id: "abc".into(),
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let unauth = Error::Auth(AuthError::Unauthorized);
        assert_eq!(unauth.status(), StatusCode::UNAUTHORIZED);

        let config = Error::Config(ConfigError::MissingEnvVar("CHOREBOARD_PASSWORD".into()));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let invalid = Error::Validation(ValidationError::EmptyTitle);
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
