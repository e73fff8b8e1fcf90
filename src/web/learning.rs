//! Per-learner records: pathways, enrollments and earned badges.
//!
//! Every route is owner-scoped through the session principal; ids in paths
//! are only ever looked up together with the caller's id.

use crate::domain::models::{EarnedAchievement, Enrollment, LearningPathway, NewPathway, Principal};
use crate::error::{AppError, AppResult};
use crate::services::progress;
use crate::state::SharedState;
use crate::web::extract::{ValidPath, ValidatedJson};
use crate::web::refresh_achievements;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePathway {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub target_role: Option<String>,
    #[validate(length(max = 100))]
    pub estimated_duration: Option<String>,
    #[validate(length(max = 50))]
    pub difficulty: Option<String>,
    /// Course ids or titles.
    #[serde(default, alias = "courseIds")]
    pub course_refs: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProgressUpdate {
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Enroll {
    pub course_id: Uuid,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/pathways", get(list_pathways).post(create_pathway))
        .route("/pathways/:id/progress", put(update_pathway_progress))
        .route("/enrollments", get(list_enrollments).post(enroll))
        .route("/enrollments/:course_id/progress", put(update_enrollment_progress))
        .route("/user/achievements", get(list_user_achievements))
        .with_state(state)
}

async fn list_pathways(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<Vec<LearningPathway>>> {
    Ok(Json(state.repo.list_pathways(principal.id).await?))
}

async fn create_pathway(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<CreatePathway>,
) -> AppResult<(StatusCode, Json<LearningPathway>)> {
    let pathway = state
        .repo
        .create_pathway(NewPathway {
            user_id: principal.id,
            title: payload.title.trim().to_string(),
            description: payload.description,
            target_role: payload.target_role,
            estimated_duration: payload.estimated_duration,
            difficulty: payload.difficulty,
            ai_generated: false,
            course_refs: payload.course_refs,
        })
        .await?;
    tracing::info!(user_id = %principal.id, pathway_id = %pathway.id, "Pathway created");
    refresh_achievements(&state, principal.id).await;
    Ok((StatusCode::CREATED, Json(pathway)))
}

async fn update_pathway_progress(
    State(state): State<SharedState>,
    principal: Principal,
    ValidPath(pathway_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProgressUpdate>,
) -> AppResult<Json<LearningPathway>> {
    state
        .repo
        .update_pathway_progress(principal.id, pathway_id, payload.progress)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("pathway"))
}

async fn list_enrollments(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<Vec<Enrollment>>> {
    Ok(Json(state.repo.list_enrollments(principal.id).await?))
}

async fn enroll(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<Enroll>,
) -> AppResult<(StatusCode, Json<Enrollment>)> {
    if state.repo.find_course(payload.course_id).await?.is_none() {
        return Err(AppError::NotFound("course"));
    }
    let enrollment = state
        .repo
        .create_enrollment(principal.id, payload.course_id)
        .await?;
    tracing::info!(user_id = %principal.id, course_id = %payload.course_id, "Enrolled");
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Sets course progress and then refreshes dependent state: pathway
/// percentages and badges. Those follow-ups are logged on failure and do
/// not undo the progress write.
async fn update_enrollment_progress(
    State(state): State<SharedState>,
    principal: Principal,
    ValidPath(course_id): ValidPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProgressUpdate>,
) -> AppResult<Json<Enrollment>> {
    let enrollment = state
        .repo
        .update_enrollment_progress(principal.id, course_id, payload.progress)
        .await?
        .ok_or(AppError::NotFound("enrollment"))?;

    match progress::sync_pathway_progress(state.repo.as_ref(), principal.id).await {
        Ok(0) => {}
        Ok(changed) => tracing::debug!(user_id = %principal.id, changed, "Pathway progress synced"),
        Err(e) => tracing::warn!(user_id = %principal.id, "Pathway progress sync failed: {}", e),
    }
    refresh_achievements(&state, principal.id).await;

    Ok(Json(enrollment))
}

async fn list_user_achievements(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<Vec<EarnedAchievement>>> {
    Ok(Json(state.repo.list_user_achievements(principal.id).await?))
}
