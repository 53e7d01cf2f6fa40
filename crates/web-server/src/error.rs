use crate::auth::AccessTier;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Missing or invalid {0} credential")]
    Unauthorized(AccessTier),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(db_err) => match db_err {
                DbError::NotFound { .. } => StatusCode::NOT_FOUND,
                DbError::DuplicateName(_) => StatusCode::BAD_REQUEST,
                DbError::ForbiddenOperation(_) => StatusCode::FORBIDDEN,
                DbError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// Converts `AppError` into a `{"detail": ...}` response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Database(db_err) if db_err.is_storage_failure() => {
                tracing::error!(error = ?db_err, "Database error.");
                "An internal database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "detail": detail }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::CoreError;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (AppError::from(DbError::not_found("player", 1)), StatusCode::NOT_FOUND),
            (
                AppError::from(DbError::DuplicateName("Alice".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(DbError::ForbiddenOperation("no".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::from(DbError::from(CoreError::Validation("bad".into()))),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(DbError::ConnectionConfigError("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Unauthorized(AccessTier::Admin), StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
