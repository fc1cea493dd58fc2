use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

/// Postgres SQLSTATE for a violated CHECK constraint
const CHECK_VIOLATION: &str = "23514";
/// Postgres SQLSTATE for a NULL in a NOT NULL column
const NOT_NULL_VIOLATION: &str = "23502";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Attachment upload failed: {0}")]
    UploadFailed(String),

    #[error("Attachment cleanup failed: {0}")]
    CleanupFailed(String),

    #[error("Insight generation failed: {0}")]
    GenerationFailed(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let code = db_err.code();
            match code.as_deref() {
                Some(CHECK_VIOLATION) | Some(NOT_NULL_VIOLATION) => {
                    let detail = db_err
                        .constraint()
                        .map(|c| format!("constraint '{}' violated", c))
                        .unwrap_or_else(|| db_err.message().to_string());
                    return AppError::Validation(detail);
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::UploadFailed(ref msg) => {
                tracing::error!("Attachment upload failed: {}", msg);
                (StatusCode::BAD_GATEWAY, self.to_string(), None)
            }
            AppError::CleanupFailed(ref msg) => {
                tracing::error!("Attachment cleanup failed: {}", msg);
                (StatusCode::BAD_GATEWAY, self.to_string(), None)
            }
            AppError::GenerationFailed(ref msg) => {
                tracing::error!("Insight generation failed: {}", msg);
                (StatusCode::BAD_GATEWAY, self.to_string(), None)
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::fmt;

    /// Postgres-style database error carrying a SQLSTATE and constraint name
    #[derive(Debug)]
    struct PgConstraintError {
        code: &'static str,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for PgConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint ({})", self.code)
        }
    }

    impl std::error::Error for PgConstraintError {}

    impl sqlx::error::DatabaseError for PgConstraintError {
        fn message(&self) -> &str {
            "new row for relation \"bills\" violates constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.code {
                CHECK_VIOLATION => sqlx::error::ErrorKind::CheckViolation,
                NOT_NULL_VIOLATION => sqlx::error::ErrorKind::NotNullViolation,
                "23505" => sqlx::error::ErrorKind::UniqueViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn database_error(code: &'static str, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgConstraintError { code, constraint }))
    }

    #[test]
    fn test_check_violation_is_validation() {
        let err = AppError::from(database_error(CHECK_VIOLATION, Some("bills_amount_non_negative")));

        assert!(
            matches!(err, AppError::Validation(ref msg) if msg.contains("bills_amount_non_negative"))
        );
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_null_violation_is_validation() {
        let err = AppError::from(database_error(NOT_NULL_VIOLATION, None));

        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("violates constraint")));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_database_errors_stay_internal() {
        let err = AppError::from(database_error(
            "23505",
            Some("bill_attachments_storage_key_key"),
        ));

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::UploadFailed("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::CleanupFailed("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::GenerationFailed("x".into()), StatusCode::BAD_GATEWAY),
            (
                AppError::from(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
