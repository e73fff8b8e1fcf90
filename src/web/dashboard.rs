use crate::analytics::{summarize, DashboardAnalytics};
use crate::domain::models::Principal;
use crate::error::AppResult;
use crate::middleware::survey_required;
use crate::state::SharedState;
use axum::{extract::State, middleware::from_fn_with_state, routing::get, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/analytics", get(analytics))
        .route_layer(from_fn_with_state(state.clone(), survey_required))
        .with_state(state)
}

async fn analytics(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<DashboardAnalytics>> {
    let repo = state.repo.as_ref();
    let (enrollments, pathways, user_skills, badges) = futures::try_join!(
        repo.list_enrollments(principal.id),
        repo.list_pathways(principal.id),
        repo.list_user_skills(principal.id),
        repo.list_user_achievements(principal.id),
    )?;
    Ok(Json(summarize(&enrollments, &pathways, &user_skills, &badges)))
}
