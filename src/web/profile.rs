use crate::domain::models::{LearningPace, Principal, ProfileChanges, User};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use crate::web::extract::ValidatedJson;
use crate::web::load_user;
use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};

static HTTP_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url pattern"));

/// Fields a user may change about themselves. Anything else in the body,
/// including `role`, is ignored.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(custom(function = "validate_image_url"))]
    pub profile_image_url: Option<String>,
    #[validate(length(max = 200))]
    pub academic_background: Option<String>,
    #[validate(length(max = 100))]
    pub current_role: Option<String>,
    #[validate(length(max = 500))]
    pub career_aspirations: Option<String>,
    #[validate(length(max = 200))]
    pub socio_economic_context: Option<String>,
    #[validate(length(max = 10))]
    pub preferred_language: Option<String>,
    pub learning_pace: Option<LearningPace>,
}

/// An empty string clears the picture; anything else must be an http(s) URL.
fn validate_image_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() || HTTP_URL.is_match(url) {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("Profile image must be a valid URL".into()))
    }
}

impl From<ProfileUpdate> for ProfileChanges {
    fn from(update: ProfileUpdate) -> Self {
        Self {
            first_name: update.first_name,
            last_name: update.last_name,
            profile_image_url: update.profile_image_url,
            academic_background: update.academic_background,
            current_role: update.current_role,
            career_aspirations: update.career_aspirations,
            socio_economic_context: update.socio_economic_context,
            preferred_language: update.preferred_language,
            learning_pace: update.learning_pace,
        }
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/user", get(current_user))
        .route("/profile", put(update_profile))
        .with_state(state)
}

async fn current_user(State(state): State<SharedState>, principal: Principal) -> AppResult<Json<User>> {
    Ok(Json(load_user(&state, principal.id).await?))
}

async fn update_profile(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(update): ValidatedJson<ProfileUpdate>,
) -> AppResult<Json<User>> {
    let user = state
        .repo
        .update_profile(principal.id, update.into())
        .await?
        .ok_or(AppError::NotFound("user"))?;
    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}
