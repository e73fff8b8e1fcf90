use crate::domain::models::{JobRole, Qualification, TrainingProgram};
use crate::error::AppResult;
use crate::state::SharedState;
use axum::{extract::State, routing::get, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/qualifications", get(qualifications))
        .route("/training-programs", get(training_programs))
        .route("/job-roles", get(job_roles))
        .with_state(state)
}

async fn qualifications(State(state): State<SharedState>) -> AppResult<Json<Vec<Qualification>>> {
    Ok(Json(state.repo.list_qualifications().await?))
}

async fn training_programs(State(state): State<SharedState>) -> AppResult<Json<Vec<TrainingProgram>>> {
    Ok(Json(state.repo.list_training_programs().await?))
}

async fn job_roles(State(state): State<SharedState>) -> AppResult<Json<Vec<JobRole>>> {
    Ok(Json(state.repo.list_job_roles().await?))
}
