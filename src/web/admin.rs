use crate::domain::models::Principal;
use crate::error::{AppError, AppResult};
use crate::middleware::policymakers_only;
use crate::state::SharedState;
use crate::web::extract::ValidPath;
use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/users/:id/unlock", post(unlock_user))
        .route_layer(from_fn_with_state(state.clone(), policymakers_only))
        .with_state(state)
}

/// Clears a locked account's failed-login counter. This is the only path
/// that lifts a lock.
async fn unlock_user(
    State(state): State<SharedState>,
    principal: Principal,
    ValidPath(user_id): ValidPath<Uuid>,
) -> AppResult<Json<Value>> {
    if !state.repo.reset_failed_logins(user_id).await? {
        return Err(AppError::NotFound("user"));
    }
    tracing::info!(admin_id = %principal.id, %user_id, "Account unlocked");
    Ok(Json(json!({ "message": "Account unlocked", "userId": user_id })))
}
