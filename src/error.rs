// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Stable machine codes for rejections the client renders differently.
pub mod codes {
    pub const NOT_SCHEDULED_TODAY: &str = "not_scheduled_today";
    pub const NOT_STARTED: &str = "not_started";
    pub const ENDED: &str = "ended";
    pub const ALREADY_SUBMITTED: &str = "already_submitted";
    pub const WRONG_ROLE: &str = "wrong_role";
    pub const DUPLICATE_FIELD: &str = "duplicate_field";
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (malformed or invalid payload)
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (time window or role violations); carries a stable code
    Forbidden { code: &'static str, message: String },

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (duplicate submission, duplicate unique field)
    Conflict { code: &'static str, message: String },
}

impl AppError {
    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
/// Forbidden and Conflict responses also carry their machine code so the
/// client can tell "not yet open", "closed" and "already submitted" apart.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, None, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, None, msg),
            AppError::Forbidden { code, message } => (StatusCode::FORBIDDEN, Some(code), message),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, Some(code), message),
        };

        let body = match code {
            Some(code) => Json(json!({
                "error": error_message,
                "code": code,
            })),
            None => Json(json!({
                "error": error_message,
            })),
        };

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
