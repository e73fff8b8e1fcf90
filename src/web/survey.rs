//! Learner onboarding survey. Saving it is what opens the survey-gated routes.

use crate::domain::models::{LearnerSurvey, LearningPace, Principal, SurveyAnswers};
use crate::error::{AppError, AppResult};
use crate::middleware::learners_only;
use crate::state::SharedState;
use crate::web::extract::ValidatedJson;
use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRequest {
    #[validate(
        length(min = 1, max = 500, message = "Academic background is required"),
        custom(function = "not_blank", message = "Academic background is required")
    )]
    pub academic_background: String,
    #[validate(length(max = 2000))]
    pub prior_skills_freeform: Option<String>,
    #[validate(length(max = 500))]
    pub socio_economic_context: Option<String>,
    #[serde(default)]
    pub learning_pace: LearningPace,
    #[validate(
        length(min = 1, max = 1000, message = "Aspirations are required"),
        custom(function = "not_blank", message = "Aspirations are required")
    )]
    pub aspirations: String,
    #[serde(default)]
    pub prior_skill_ids: Vec<Uuid>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

impl From<SurveyRequest> for SurveyAnswers {
    fn from(req: SurveyRequest) -> Self {
        Self {
            academic_background: req.academic_background,
            prior_skills_freeform: req.prior_skills_freeform,
            socio_economic_context: req.socio_economic_context,
            learning_pace: req.learning_pace,
            aspirations: req.aspirations,
            prior_skill_ids: req.prior_skill_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SurveySaved {
    pub message: &'static str,
    pub survey: LearnerSurvey,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStatus {
    pub completed: bool,
    pub has_basic_info: bool,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/me", get(get_survey).post(save_survey))
        .route("/status", get(survey_status))
        .route_layer(from_fn_with_state(state.clone(), learners_only))
        .with_state(state)
}

async fn get_survey(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<LearnerSurvey>> {
    state
        .repo
        .find_survey(principal.id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("survey"))
}

/// Creates or replaces the caller's survey. Onboarding is marked complete only
/// once the stored answers carry an academic background and aspirations.
async fn save_survey(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<SurveyRequest>,
) -> AppResult<Json<SurveySaved>> {
    let survey = state.repo.upsert_survey(principal.id, payload.into()).await?;
    if survey.has_basic_info() {
        state.repo.mark_survey_completed(principal.id).await?;
    }
    tracing::info!(user_id = %principal.id, "Survey saved");
    Ok(Json(SurveySaved {
        message: "Survey saved successfully",
        survey,
    }))
}

async fn survey_status(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<SurveyStatus>> {
    let survey = state.repo.find_survey(principal.id).await?;
    Ok(Json(SurveyStatus {
        completed: survey.is_some(),
        has_basic_info: survey.as_ref().is_some_and(LearnerSurvey::has_basic_info),
    }))
}
