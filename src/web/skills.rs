use crate::domain::models::{Principal, ProficiencyLevel, Skill, UserSkill};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use crate::web::extract::ValidatedJson;
use crate::web::refresh_achievements;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct SkillQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssessSkill {
    pub skill_id: Uuid,
    pub proficiency_level: ProficiencyLevel,
    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100"))]
    pub proficiency_score: i32,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/skills", get(list_skills))
        .route("/user/skills", get(list_user_skills).post(assess_skill))
        .with_state(state)
}

async fn list_skills(
    State(state): State<SharedState>,
    Query(query): Query<SkillQuery>,
) -> AppResult<Json<Vec<Skill>>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let skills = match category {
        Some(category) => state.repo.list_skills_by_category(category).await?,
        None => state.repo.list_skills().await?,
    };
    Ok(Json(skills))
}

async fn list_user_skills(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<Vec<UserSkill>>> {
    Ok(Json(state.repo.list_user_skills(principal.id).await?))
}

/// Records a self-assessment. Re-assessing a skill overwrites the previous
/// level and score instead of adding a row.
async fn assess_skill(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<AssessSkill>,
) -> AppResult<Json<UserSkill>> {
    if state.repo.find_skill(payload.skill_id).await?.is_none() {
        return Err(AppError::NotFound("skill"));
    }
    let row = state
        .repo
        .upsert_user_skill(
            principal.id,
            payload.skill_id,
            payload.proficiency_level,
            payload.proficiency_score,
        )
        .await?;
    refresh_achievements(&state, principal.id).await;
    Ok(Json(row))
}
