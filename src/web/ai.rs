use crate::analytics::progress_summary;
use crate::domain::models::{
    AiAnalysis, AnalysisType, Course, CourseFilter, LearningPathway, NewPathway, Principal,
};
use crate::error::{AppError, AppResult};
use crate::middleware::survey_required;
use crate::services::ai::{CareerGuidance, PathwayDraft, SkillGapAnalysis};
use crate::state::SharedState;
use crate::web::extract::ValidatedJson;
use crate::web::{load_user, refresh_achievements};
use axum::{
    extract::{Query, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const DEFAULT_RECOMMENDATIONS: usize = 10;
const MAX_RECOMMENDATIONS: usize = 50;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SkillAnalysisRequest {
    #[validate(length(min = 1, max = 200, message = "Target role is required"))]
    pub target_role: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PathwayRequest {
    #[validate(length(min = 1, max = 200, message = "Target role is required"))]
    pub target_role: String,
    pub skill_gap_analysis: SkillGapAnalysis,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayResponse {
    pub pathway: PathwayDraft,
    pub saved_pathway: LearningPathway,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Unparseable or missing limits fall back to the default; the rest are
/// clamped into range.
fn recommendation_limit(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|&n| n != 0)
        .map(|n| n.clamp(1, MAX_RECOMMENDATIONS as i64) as usize)
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
}

fn parse_analysis_type(raw: &str) -> AppResult<AnalysisType> {
    match raw {
        "skill_gap" => Ok(AnalysisType::SkillGap),
        "pathway_recommendation" => Ok(AnalysisType::PathwayRecommendation),
        "career_guidance" => Ok(AnalysisType::CareerGuidance),
        other => Err(AppError::Validation(format!("Unknown analysis type: {other}"))),
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/skill-analysis", post(skill_analysis))
        .route("/generate-pathway", post(generate_pathway))
        .route("/course-recommendations", get(course_recommendations))
        .route("/career-guidance", post(career_guidance))
        .route_layer(from_fn_with_state(state.clone(), survey_required))
        .route("/analyses", get(list_analyses))
        .with_state(state)
}

async fn skill_analysis(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<SkillAnalysisRequest>,
) -> AppResult<Json<SkillGapAnalysis>> {
    let user = load_user(&state, principal.id).await?;
    let user_skills = state.repo.list_user_skills(user.id).await?;
    let catalog = state.repo.list_skills().await?;

    let analysis = state
        .advisor
        .analyze_skill_gap(&user, &user_skills, &catalog, payload.target_role.trim())
        .await?;
    tracing::info!(user_id = %user.id, gaps = analysis.skill_gaps.len(), "Skill gap analysed");
    Ok(Json(analysis))
}

/// Drafts a pathway from a gap analysis and stores it as an AI pathway.
async fn generate_pathway(
    State(state): State<SharedState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<PathwayRequest>,
) -> AppResult<Json<PathwayResponse>> {
    let user = load_user(&state, principal.id).await?;
    let catalog = state.repo.list_courses(&CourseFilter::default()).await?;
    let target_role = payload.target_role.trim().to_string();

    let draft = state
        .advisor
        .generate_learning_pathway(&user, &payload.skill_gap_analysis, &catalog, &target_role)
        .await?;

    let saved = state
        .repo
        .create_pathway(NewPathway {
            user_id: user.id,
            title: draft.title.clone(),
            description: Some(draft.description.clone()),
            target_role: Some(target_role),
            estimated_duration: Some(draft.duration.clone()),
            difficulty: Some(draft.difficulty.clone()),
            ai_generated: true,
            course_refs: draft.course_refs(),
        })
        .await?;
    tracing::info!(user_id = %user.id, pathway_id = %saved.id, "AI pathway saved");
    refresh_achievements(&state, user.id).await;

    Ok(Json(PathwayResponse {
        pathway: draft,
        saved_pathway: saved,
    }))
}

async fn course_recommendations(
    State(state): State<SharedState>,
    principal: Principal,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<Course>>> {
    let limit = recommendation_limit(query.limit.as_deref());
    let user = load_user(&state, principal.id).await?;
    let user_skills = state.repo.list_user_skills(user.id).await?;
    let catalog = state.repo.list_courses(&CourseFilter::default()).await?;

    let courses = state
        .advisor
        .recommend_courses(&user, &user_skills, &catalog, limit)
        .await?;
    Ok(Json(courses))
}

async fn career_guidance(
    State(state): State<SharedState>,
    principal: Principal,
) -> AppResult<Json<CareerGuidance>> {
    let user = load_user(&state, principal.id).await?;
    let trends = state.repo.list_industry_trends(None).await?;
    let enrollments = state.repo.list_enrollments(user.id).await?;
    let user_skills = state.repo.list_user_skills(user.id).await?;

    let guidance = state
        .advisor
        .generate_career_guidance(&user, &trends, progress_summary(&enrollments, &user_skills))
        .await?;
    Ok(Json(guidance))
}

async fn list_analyses(
    State(state): State<SharedState>,
    principal: Principal,
    Query(query): Query<AnalysisQuery>,
) -> AppResult<Json<Vec<AiAnalysis>>> {
    let kind = match query.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(raw) => Some(parse_analysis_type(raw)?),
        None => None,
    };
    Ok(Json(state.repo.list_analyses(principal.id, kind).await?))
}
