//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("database provider is not configured")]
    MissingProvider,
    #[error("connection string for provider '{0}' is missing or empty")]
    MissingConnectionString(String),
    #[error("unsupported database provider '{0}'")]
    UnsupportedProvider(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("database connection is not open")]
    State,
    #[error("validation: {0}")]
    Validation(String),
    #[error("query produced no result set: {0}")]
    Query(String),
    #[error("database error: {message}")]
    Database {
        message: String,
        sqlstate: Option<String>,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication: {0}")]
    Authentication(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => AppError::Connection(err),
            sqlx::Error::Protocol(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => AppError::Query(err.to_string()),
            sqlx::Error::Database(db) => {
                let sqlstate = db.code().map(|c| c.to_string());
                AppError::Database {
                    message: db.message().to_string(),
                    sqlstate,
                }
            }
            sqlx::Error::RowNotFound => AppError::NotFound("no matching row".into()),
            other => AppError::Database {
                message: other.to_string(),
                sqlstate: None,
            },
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Connection(_) => (StatusCode::INTERNAL_SERVER_ERROR, "connection_error"),
            AppError::State => (StatusCode::INTERNAL_SERVER_ERROR, "state_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Query(_) => (StatusCode::INTERNAL_SERVER_ERROR, "query_error"),
            AppError::Database { sqlstate, .. } => match sqlstate.as_deref() {
                // undefined_table: the request named a table that does not exist
                Some("42P01") => (StatusCode::NOT_FOUND, "undefined_table"),
                // foreign_key_violation / unique_violation
                Some("23503") | Some("23505") => (StatusCode::CONFLICT, "constraint_violation"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        }
        // Driver messages are surfaced to the caller on purpose: the original
        // surface trades information hiding for debuggability.
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let (status, code) = AppError::Validation("x".into()).status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "validation_error");
    }

    #[test]
    fn not_found_and_authentication_are_distinct() {
        let (nf, _) = AppError::NotFound("u".into()).status_and_code();
        let (auth, _) = AppError::Authentication("p".into()).status_and_code();
        assert_eq!(nf, StatusCode::NOT_FOUND);
        assert_eq!(auth, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn undefined_table_sqlstate_maps_to_not_found() {
        let err = AppError::Database {
            message: "relation does not exist".into(),
            sqlstate: Some("42P01".into()),
        };
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn constraint_sqlstates_map_to_conflict() {
        for code in ["23503", "23505"] {
            let err = AppError::Database {
                message: "constraint".into(),
                sqlstate: Some(code.into()),
            };
            assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
        }
    }

    #[test]
    fn state_error_is_server_side() {
        assert_eq!(
            AppError::State.status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
