use crate::domain::models::{NewUser, Principal, PublicUser, UserRole};
use crate::error::{AppError, AppResult, INVALID_CREDENTIALS};
use crate::services::password;
use crate::state::SharedState;
use crate::web::extract::ValidatedJson;
use crate::web::session;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use validator::Validate;

/// Failed attempts after which login refuses even a correct password.
pub const LOCK_THRESHOLD: i32 = 3;

/// Registration body. A client-supplied `role` is not part of the schema and
/// is dropped during deserialization; every account starts as a learner.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(deserialize_with = "normalized_email")]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "normalized_email")]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}

/// Emails are matched trimmed and lower-cased, so they are checked that way too.
fn normalized_email<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|email| email.trim().to_lowercase())
}

fn issue_cookie(state: &SharedState, user_id: uuid::Uuid) -> AppResult<String> {
    let token = session::sign_session(user_id, &state.config.session_secret)
        .map_err(|e| AppError::Internal(format!("failed to sign session: {e}")))?;
    Ok(session::auth_cookie(&token, state.config.secure_cookies))
}

async fn register(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let email = payload.email;
    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists with this email".to_string()));
    }

    let password_hash = password::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let user = state
        .repo
        .create_user(NewUser {
            email,
            password_hash,
            role: UserRole::Learner,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
        })
        .await?;
    tracing::info!(user_id = %user.id, "User registered");

    let cookie = issue_cookie(&state, user.id)?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Registration successful",
            user: PublicUser::from(&user),
        }),
    ))
}

/// The lock is checked before the password so that a correct password cannot
/// clear it; only the admin unlock path resets the counter.
async fn login(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let Some(user) = state.repo.find_user_by_email(&payload.email).await? else {
        tracing::warn!("Login attempt for unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };

    if user.failed_login_count >= LOCK_THRESHOLD {
        tracing::warn!(user_id = %user.id, "Login attempt on locked account");
        return Err(AppError::Locked);
    }

    if !password::verify_password(&payload.password, &user.password_hash) {
        let failures = state.repo.record_failed_login(user.id).await?;
        tracing::warn!(user_id = %user.id, failures, "Failed login");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    state.repo.record_successful_login(user.id).await?;
    let cookie = issue_cookie(&state, user.id)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful",
            user: PublicUser::from(&user),
        }),
    ))
}

async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session::clear_cookie())],
        Json(json!({ "message": "Logout successful" })),
    )
}

async fn me(principal: Principal) -> Json<serde_json::Value> {
    Json(json!({ "user": principal }))
}
