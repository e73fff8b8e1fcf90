//! Public catalog reads: courses, the achievement list and industry trends.

use crate::domain::models::{Achievement, Course, CourseFilter, IndustryTrend, ProficiencyLevel};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use crate::web::extract::ValidPath;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

const NSQF_LEVELS: std::ops::RangeInclusive<i32> = 1..=10;

/// Raw course query string. Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuery {
    pub category: Option<String>,
    pub skill_level: Option<String>,
    pub nsqf_level: Option<String>,
    pub search: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CourseQuery {
    pub fn into_filter(self) -> AppResult<CourseFilter> {
        let skill_level = match non_empty(self.skill_level) {
            Some(raw) => Some(
                ProficiencyLevel::try_from(raw.as_str())
                    .map_err(|_| AppError::Validation(format!("Unknown skill level: {raw}")))?,
            ),
            None => None,
        };
        let nsqf_level = match non_empty(self.nsqf_level) {
            Some(raw) => {
                let level: i32 = raw
                    .parse()
                    .map_err(|_| AppError::Validation(format!("NSQF level must be a number: {raw}")))?;
                if !NSQF_LEVELS.contains(&level) {
                    return Err(AppError::Validation("NSQF level must be between 1 and 10".into()));
                }
                Some(level)
            }
            None => None,
        };
        Ok(CourseFilter {
            category: non_empty(self.category),
            skill_level,
            nsqf_level,
            search: non_empty(self.search),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub sector: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/:id", get(get_course))
        .route("/achievements", get(list_achievements))
        .route("/industry-trends", get(list_trends))
        .with_state(state)
}

async fn list_courses(
    State(state): State<SharedState>,
    Query(query): Query<CourseQuery>,
) -> AppResult<Json<Vec<Course>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.repo.list_courses(&filter).await?))
}

async fn get_course(
    State(state): State<SharedState>,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<Course>> {
    state
        .repo
        .find_course(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("course"))
}

async fn list_achievements(State(state): State<SharedState>) -> AppResult<Json<Vec<Achievement>>> {
    Ok(Json(state.repo.list_achievements().await?))
}

async fn list_trends(
    State(state): State<SharedState>,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<Vec<IndustryTrend>>> {
    let sector = non_empty(query.sector);
    Ok(Json(state.repo.list_industry_trends(sector.as_deref()).await?))
}
