use crate::domain::models::Principal;
use crate::error::{AppError, AppResult};
use crate::middleware::{learners_only, survey_required};
use crate::services::ai::ChatReply;
use crate::services::prompts::ChatContext;
use crate::state::SharedState;
use crate::web::extract::ValidatedJson;
use axum::{extract::State, middleware::from_fn_with_state, routing::post, Json, Router};
use serde::Deserialize;
use validator::Validate;

/// Reference rows of each kind handed to the model per message.
const CONTEXT_ROWS: usize = 10;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,
    pub conversation_id: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    // The last layer added runs first: role check, then survey check.
    Router::new()
        .route("/career-guidance", post(career_guidance))
        .route_layer(from_fn_with_state(state.clone(), survey_required))
        .route_layer(from_fn_with_state(state.clone(), learners_only))
        .with_state(state)
}

async fn career_guidance(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<ChatMessage>,
) -> AppResult<Json<ChatReply>> {
    let survey = state
        .repo
        .find_survey(principal.id)
        .await?
        .ok_or_else(|| AppError::Validation("User profile or survey data not found".into()))?;
    let user_skills = state.repo.list_user_skills(principal.id).await?;
    let skills = state.repo.list_skills().await?;
    let mut qualifications = state.repo.list_qualifications().await?;
    let mut programs = state.repo.list_training_programs().await?;
    let mut job_roles = state.repo.list_job_roles().await?;
    qualifications.truncate(CONTEXT_ROWS);
    programs.truncate(CONTEXT_ROWS);
    job_roles.truncate(CONTEXT_ROWS);

    let ctx = ChatContext {
        survey: &survey,
        user_skills: &user_skills,
        skills: &skills,
        qualifications: &qualifications,
        programs: &programs,
        job_roles: &job_roles,
    };
    let reply = state
        .advisor
        .career_chat(&principal, payload.message.trim(), payload.conversation_id, &ctx)
        .await?;
    tracing::info!(
        user_id = %principal.id,
        suggestions = reply.suggestions.len(),
        "Chatbot replied"
    );
    Ok(Json(reply))
}
