use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Learner,
    Trainer,
    Policymaker,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "learning_pace", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LearningPace {
    Slow,
    #[default]
    Moderate,
    Fast,
}

impl LearningPace {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningPace::Slow => "slow",
            LearningPace::Moderate => "moderate",
            LearningPace::Fast => "fast",
        }
    }
}

/// Proficiency of a learner in a skill, also used as the level a course targets.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(type_name = "proficiency_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "beginner",
            ProficiencyLevel::Intermediate => "intermediate",
            ProficiencyLevel::Advanced => "advanced",
        }
    }
}

impl TryFrom<&str> for ProficiencyLevel {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "beginner" => Ok(ProficiencyLevel::Beginner),
            "intermediate" => Ok(ProficiencyLevel::Intermediate),
            "advanced" => Ok(ProficiencyLevel::Advanced),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    InProgress,
    Completed,
    Dropped,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "analysis_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    SkillGap,
    PathwayRecommendation,
    CareerGuidance,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub survey_completed: bool,
    #[serde(skip_serializing)]
    pub failed_login_count: i32,
    pub last_login: Option<DateTime<Utc>>,
    pub academic_background: Option<String>,
    #[sqlx(rename = "current_occupation")]
    pub current_role: Option<String>,
    pub career_aspirations: Option<String>,
    pub socio_economic_context: Option<String>,
    pub preferred_language: String,
    pub learning_pace: LearningPace,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The projection returned by the auth endpoints.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub survey_completed: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            survey_completed: user.survey_completed,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
}

/// Profile fields a user may change about themselves. Role, password hash,
/// survey flag and login counters are deliberately absent.
#[derive(Clone, Debug, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub academic_background: Option<String>,
    pub current_role: Option<String>,
    pub career_aspirations: Option<String>,
    pub socio_economic_context: Option<String>,
    pub preferred_language: Option<String>,
    pub learning_pace: Option<LearningPace>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub nsqf_level: Option<i32>,
    pub description: Option<String>,
    pub industry_demand: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSkill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub proficiency_level: ProficiencyLevel,
    pub proficiency_score: i32,
    pub last_assessed: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub provider: String,
    pub duration: Option<String>,
    pub nsqf_level: Option<i32>,
    pub skill_level: Option<ProficiencyLevel>,
    pub category: String,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub is_certified: bool,
    pub created_at: DateTime<Utc>,
}

/// Optional course predicates; every present field must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub skill_level: Option<ProficiencyLevel>,
    pub nsqf_level: Option<i32>,
    pub search: Option<String>,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        if let Some(category) = &self.category {
            if &course.category != category {
                return false;
            }
        }
        if let Some(level) = self.skill_level {
            if course.skill_level != Some(level) {
                return false;
            }
        }
        if let Some(nsqf) = self.nsqf_level {
            if course.nsqf_level != Some(nsqf) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = course.title.to_lowercase().contains(&needle)
                || course
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || course.provider.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub progress: i32,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathway {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_role: Option<String>,
    pub estimated_duration: Option<String>,
    pub difficulty: Option<String>,
    pub progress: i32,
    pub ai_generated: bool,
    pub course_refs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewPathway {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_role: Option<String>,
    pub estimated_duration: Option<String>,
    pub difficulty: Option<String>,
    pub ai_generated: bool,
    pub course_refs: Vec<String>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub icon: String,
    pub category: String,
    pub points: i32,
    pub requirements: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EarnedAchievement {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub icon: String,
    pub category: String,
    pub points: i32,
    pub earned_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IndustryTrend {
    pub id: Uuid,
    pub sector: String,
    pub skill_name: String,
    pub demand_growth: Option<f64>,
    pub salary_range: Option<String>,
    pub job_count: Option<i32>,
    pub location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LearnerSurvey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub academic_background: String,
    pub prior_skills_freeform: Option<String>,
    pub socio_economic_context: Option<String>,
    pub learning_pace: LearningPace,
    pub aspirations: String,
    pub prior_skill_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearnerSurvey {
    /// A survey only counts once both free-text anchors are filled in.
    pub fn has_basic_info(&self) -> bool {
        !self.academic_background.trim().is_empty() && !self.aspirations.trim().is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct SurveyAnswers {
    pub academic_background: String,
    pub prior_skills_freeform: Option<String>,
    pub socio_economic_context: Option<String>,
    pub learning_pace: LearningPace,
    pub aspirations: String,
    pub prior_skill_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub analysis_type: AnalysisType,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewAnalysis {
    pub user_id: Uuid,
    pub analysis_type: AnalysisType,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub confidence: f64,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub sector: String,
    pub nsqf_level: i32,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgram {
    pub id: Uuid,
    pub title: String,
    pub provider: String,
    pub mode: String,
    pub duration: String,
    pub nsqf_level: i32,
    pub sector: String,
    pub qualification_codes: Vec<String>,
    pub is_certified: bool,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRole {
    pub id: Uuid,
    pub title: String,
    pub sector: String,
    pub nsqf_level: i32,
    pub qualification_codes: Vec<String>,
    pub description: Option<String>,
    pub salary_range: Option<String>,
    pub demand_level: Option<String>,
}

/// Authenticated caller, re-read from storage on every request.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub survey_completed: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            survey_completed: user.survey_completed,
        }
    }
}
