use crate::db::DbError;
use crate::services::ai::AdvisoryError;
use crate::web::session;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};

/// Errors surfaced by HTTP handlers.
///
/// Authentication and authorization failures carry fixed, generic messages.
/// Storage and advisory failures are logged in full and reported to the client
/// as a generic internal error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid fields: {0}")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Token missing, forged, expired, or pointing at a deleted user.
    /// The response also clears the auth cookie.
    #[error("invalid session")]
    InvalidSession,

    #[error("forbidden")]
    Forbidden,

    #[error("survey completion required")]
    SurveyRequired,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("account locked")]
    Locked,

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

pub const AUTH_REQUIRED: &str = "Authentication required";
pub const ACCESS_FORBIDDEN: &str = "Access forbidden";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ACCOUNT_LOCKED: &str =
    "Account locked due to multiple failed attempts. Please contact support.";
const INTERNAL: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra = Map::new();
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidFields(errors) => {
                extra.insert("fields".to_string(), field_messages(errors));
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Validation failed".to_string(),
                )
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.to_string())
            }
            AppError::InvalidSession => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", AUTH_REQUIRED.to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", ACCESS_FORBIDDEN.to_string()),
            AppError::SurveyRequired => {
                extra.insert("redirectTo".to_string(), Value::from("/survey"));
                (
                    StatusCode::FORBIDDEN,
                    "SURVEY_REQUIRED",
                    "Survey completion required".to_string(),
                )
            }
            AppError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", capitalize(entity)),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Locked => (StatusCode::LOCKED, "ACCOUNT_LOCKED", ACCOUNT_LOCKED.to_string()),
            AppError::Advisory(err) => {
                tracing::error!(error = %err, "Advisory service failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "ADVISORY_UNAVAILABLE", INTERNAL.to_string())
            }
            AppError::Db(DbError::Conflict(msg)) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Db(DbError::MissingReference(entity)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", capitalize(entity)),
            ),
            AppError::Db(err) => {
                tracing::error!(error = %err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL.to_string())
            }
        };

        let mut body = Map::new();
        body.insert("error".to_string(), Value::from(message));
        body.insert("code".to_string(), Value::from(code));
        body.extend(extra);

        let mut response = (status, axum::Json(Value::Object(body))).into_response();
        if matches!(self, AppError::InvalidSession) {
            if let Ok(cookie) = HeaderValue::from_str(&session::clear_cookie()) {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
        }
        response
    }
}

fn field_messages(errors: &validator::ValidationErrors) -> Value {
    let mut fields = Map::new();
    for (field, errs) in errors.field_errors() {
        let messages: Vec<Value> = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| Value::from(m.to_string()))
                    .unwrap_or_else(|| Value::from(format!("invalid {}", e.code)))
            })
            .collect();
        fields.insert(camel_case(field), Value::Array(messages));
    }
    json!(fields)
}

/// Request bodies are camelCase on the wire; field errors are keyed the same way.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
