use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;

use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    #[error("{entity} `{key}` not found")]
    NotFound { entity: &'static str, key: String },

    #[error("database error: {0}")]
    Db(DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound { entity, key: key.to_string() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        // unique index violations surface as a field error, same as the pre-insert check
        if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
            let field = unique_violation_column(&msg).unwrap_or("url");
            return Self::Validation(FieldErrors::single(field, "A record with this value already exists."));
        }
        Self::Db(err)
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let errors = match &rejection {
            JsonRejection::JsonDataError(err) => rejected_field(&err.body_text()),
            _ => FieldErrors::single(NON_FIELD_ERRORS, rejection.body_text()),
        };
        Self::Validation(errors)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejected_field(&rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(FieldErrors::single("id", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(errors) => json!({ "errors": errors }),
            AppError::NotFound { .. } => json!({ "error": self.to_string() }),
            AppError::Db(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                json!({ "error": "internal server error" })
            },
        };
        (status, Json(body)).into_response()
    }
}

/// SQLite reports `UNIQUE constraint failed: movie.url`.
fn unique_violation_column(msg: &str) -> Option<&str> {
    let (_, cols) = msg.split_once("UNIQUE constraint failed:")?;
    let first = cols.split(',').next()?.trim();
    first.rsplit('.').next().filter(|c| !c.is_empty())
}

/// Key for errors that belong to the payload as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Deserialization failures read `<context>: <path>: <message>`, where the
/// path starts with the offending top-level field.
fn rejected_field(text: &str) -> FieldErrors {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    if let Some((path, message)) = detail.split_once(": ") {
        let field = path.split(['.', '[']).next().unwrap_or_default();
        if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return FieldErrors::single(field, message);
        }
    }
    FieldErrors::single(NON_FIELD_ERRORS, detail)
}

pub type AppResult<T> = Result<T, AppError>;
