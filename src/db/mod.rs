pub mod seed;

#[cfg(test)]
pub mod memory;

use crate::domain::models::{
    Achievement, AiAnalysis, AnalysisType, Course, CourseFilter, EarnedAchievement, Enrollment,
    IndustryTrend, JobRole, LearnerSurvey, LearningPathway, NewAnalysis, NewPathway, NewUser,
    ProfileChanges, ProficiencyLevel, Qualification, Skill, SurveyAnswers, TrainingProgram, User,
    UserSkill,
};
use crate::domain::progress::derive_enrollment_state;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A unique constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    /// A foreign key pointed at a row that does not exist.
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => return DbError::Conflict(conflict_message(&constraint)),
                Some("23503") => return DbError::MissingReference(referenced_entity(&constraint)),
                _ => {}
            }
        }
        DbError::Sqlx(err)
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_email" => "User already exists with this email".to_string(),
        "uq_enrollments_user_course" => "Already enrolled in this course".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}

fn referenced_entity(constraint: &str) -> &'static str {
    if constraint.contains("course_id") {
        "course"
    } else if constraint.contains("skill_id") {
        "skill"
    } else if constraint.contains("achievement_id") {
        "achievement"
    } else if constraint.contains("user_id") {
        "user"
    } else {
        "resource"
    }
}

/// Storage operations, one group per entity.
///
/// Every per-user operation takes the owner id and filters on it. List
/// operations return rows in a fixed order so repeated calls render the same.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> DbResult<User>;
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>>;
    /// Atomically bumps the failed-login counter and returns the new value.
    async fn record_failed_login(&self, id: Uuid) -> DbResult<i32>;
    async fn record_successful_login(&self, id: Uuid) -> DbResult<()>;
    async fn reset_failed_logins(&self, id: Uuid) -> DbResult<bool>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> DbResult<Option<User>>;
    async fn mark_survey_completed(&self, id: Uuid) -> DbResult<()>;

    async fn list_skills(&self) -> DbResult<Vec<Skill>>;
    async fn list_skills_by_category(&self, category: &str) -> DbResult<Vec<Skill>>;
    async fn find_skill(&self, id: Uuid) -> DbResult<Option<Skill>>;
    async fn list_user_skills(&self, user_id: Uuid) -> DbResult<Vec<UserSkill>>;
    async fn upsert_user_skill(
        &self,
        user_id: Uuid,
        skill_id: Uuid,
        level: ProficiencyLevel,
        score: i32,
    ) -> DbResult<UserSkill>;

    async fn list_courses(&self, filter: &CourseFilter) -> DbResult<Vec<Course>>;
    async fn find_course(&self, id: Uuid) -> DbResult<Option<Course>>;

    async fn list_enrollments(&self, user_id: Uuid) -> DbResult<Vec<Enrollment>>;
    async fn create_enrollment(&self, user_id: Uuid, course_id: Uuid) -> DbResult<Enrollment>;
    async fn update_enrollment_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
    ) -> DbResult<Option<Enrollment>>;

    async fn list_pathways(&self, user_id: Uuid) -> DbResult<Vec<LearningPathway>>;
    async fn create_pathway(&self, pathway: NewPathway) -> DbResult<LearningPathway>;
    async fn update_pathway_progress(
        &self,
        user_id: Uuid,
        pathway_id: Uuid,
        progress: i32,
    ) -> DbResult<Option<LearningPathway>>;

    async fn list_achievements(&self) -> DbResult<Vec<Achievement>>;
    async fn list_user_achievements(&self, user_id: Uuid) -> DbResult<Vec<EarnedAchievement>>;
    /// Returns `true` only when a new row was written.
    async fn award_achievement(&self, user_id: Uuid, achievement_id: Uuid) -> DbResult<bool>;

    async fn list_industry_trends(&self, sector: Option<&str>) -> DbResult<Vec<IndustryTrend>>;

    async fn find_survey(&self, user_id: Uuid) -> DbResult<Option<LearnerSurvey>>;
    async fn upsert_survey(&self, user_id: Uuid, answers: SurveyAnswers) -> DbResult<LearnerSurvey>;

    async fn append_analysis(&self, analysis: NewAnalysis) -> DbResult<AiAnalysis>;
    async fn list_analyses(
        &self,
        user_id: Uuid,
        kind: Option<AnalysisType>,
    ) -> DbResult<Vec<AiAnalysis>>;

    async fn list_qualifications(&self) -> DbResult<Vec<Qualification>>;
    async fn list_training_programs(&self) -> DbResult<Vec<TrainingProgram>>;
    async fn list_job_roles(&self) -> DbResult<Vec<JobRole>>;
}

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "\
    id, email, password_hash, role, first_name, last_name, profile_image_url, \
    survey_completed, failed_login_count, last_login, academic_background, current_occupation, \
    career_aspirations, socio_economic_context, preferred_language, learning_pace, \
    created_at, updated_at";

/// Escapes `LIKE` wildcards so user search text matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, role, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn record_failed_login(&self, id: Uuid) -> DbResult<i32> {
        let count: i32 = sqlx::query_scalar(
            r#"
            UPDATE users
            SET failed_login_count = failed_login_count + 1,
                updated_at = now()
            WHERE id = $1
            RETURNING failed_login_count
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn record_successful_login(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_count = 0,
                last_login = now(),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_failed_logins(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET failed_login_count = 0, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> DbResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                profile_image_url = COALESCE($4, profile_image_url),
                academic_background = COALESCE($5, academic_background),
                current_occupation = COALESCE($6, current_occupation),
                career_aspirations = COALESCE($7, career_aspirations),
                socio_economic_context = COALESCE($8, socio_economic_context),
                preferred_language = COALESCE($9, preferred_language),
                learning_pace = COALESCE($10, learning_pace),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.profile_image_url)
            .bind(changes.academic_background)
            .bind(changes.current_role)
            .bind(changes.career_aspirations)
            .bind(changes.socio_economic_context)
            .bind(changes.preferred_language)
            .bind(changes.learning_pace)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn mark_survey_completed(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE users SET survey_completed = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_skills(&self) -> DbResult<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>("SELECT * FROM skills ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(skills)
    }

    async fn list_skills_by_category(&self, category: &str) -> DbResult<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(
            "SELECT * FROM skills WHERE category = $1 ORDER BY name, id",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    async fn find_skill(&self, id: Uuid) -> DbResult<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(skill)
    }

    async fn list_user_skills(&self, user_id: Uuid) -> DbResult<Vec<UserSkill>> {
        let rows = sqlx::query_as::<_, UserSkill>(
            "SELECT * FROM user_skills WHERE user_id = $1 ORDER BY last_assessed DESC, skill_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_user_skill(
        &self,
        user_id: Uuid,
        skill_id: Uuid,
        level: ProficiencyLevel,
        score: i32,
    ) -> DbResult<UserSkill> {
        let row = sqlx::query_as::<_, UserSkill>(
            r#"
            INSERT INTO user_skills (user_id, skill_id, proficiency_level, proficiency_score)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, skill_id) DO UPDATE
            SET proficiency_level = EXCLUDED.proficiency_level,
                proficiency_score = EXCLUDED.proficiency_score,
                last_assessed = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(level)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_courses(&self, filter: &CourseFilter) -> DbResult<Vec<Course>> {
        let search = filter.search.as_deref().map(like_pattern);
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::proficiency_level IS NULL OR skill_level = $2)
              AND ($3::INTEGER IS NULL OR nsqf_level = $3)
              AND ($4::TEXT IS NULL
                   OR title ILIKE $4 ESCAPE '\'
                   OR description ILIKE $4 ESCAPE '\'
                   OR provider ILIKE $4 ESCAPE '\')
            ORDER BY created_at DESC, title
            "#,
        )
        .bind(filter.category.as_deref())
        .bind(filter.skill_level)
        .bind(filter.nsqf_level)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn find_course(&self, id: Uuid) -> DbResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn list_enrollments(&self, user_id: Uuid) -> DbResult<Vec<Enrollment>> {
        let rows = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_enrollment(&self, user_id: Uuid, course_id: Uuid) -> DbResult<Enrollment> {
        let row = sqlx::query_as::<_, Enrollment>(
            "INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_enrollment_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
    ) -> DbResult<Option<Enrollment>> {
        let state = derive_enrollment_state(progress, Utc::now());
        let row = sqlx::query_as::<_, Enrollment>(
            r#"
            UPDATE enrollments
            SET progress = $3, status = $4, completed_at = $5
            WHERE user_id = $1 AND course_id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(state.progress)
        .bind(state.status)
        .bind(state.completed_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_pathways(&self, user_id: Uuid) -> DbResult<Vec<LearningPathway>> {
        let rows = sqlx::query_as::<_, LearningPathway>(
            "SELECT * FROM learning_pathways WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_pathway(&self, pathway: NewPathway) -> DbResult<LearningPathway> {
        let row = sqlx::query_as::<_, LearningPathway>(
            r#"
            INSERT INTO learning_pathways
                (user_id, title, description, target_role, estimated_duration, difficulty,
                 ai_generated, course_refs)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(pathway.user_id)
        .bind(&pathway.title)
        .bind(&pathway.description)
        .bind(&pathway.target_role)
        .bind(&pathway.estimated_duration)
        .bind(&pathway.difficulty)
        .bind(pathway.ai_generated)
        .bind(&pathway.course_refs)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_pathway_progress(
        &self,
        user_id: Uuid,
        pathway_id: Uuid,
        progress: i32,
    ) -> DbResult<Option<LearningPathway>> {
        let row = sqlx::query_as::<_, LearningPathway>(
            r#"
            UPDATE learning_pathways
            SET progress = $3, updated_at = now()
            WHERE id = $2 AND user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(pathway_id)
        .bind(progress.clamp(0, 100))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_achievements(&self) -> DbResult<Vec<Achievement>> {
        let rows = sqlx::query_as::<_, Achievement>("SELECT * FROM achievements ORDER BY title, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_user_achievements(&self, user_id: Uuid) -> DbResult<Vec<EarnedAchievement>> {
        let rows = sqlx::query_as::<_, EarnedAchievement>(
            r#"
            SELECT a.id, a.title, a.description, a.icon, a.category, a.points, ua.earned_at
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = $1
            ORDER BY ua.earned_at DESC, a.title
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn award_achievement(&self, user_id: Uuid, achievement_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_industry_trends(&self, sector: Option<&str>) -> DbResult<Vec<IndustryTrend>> {
        let rows = sqlx::query_as::<_, IndustryTrend>(
            r#"
            SELECT * FROM industry_trends
            WHERE ($1::TEXT IS NULL OR sector = $1)
            ORDER BY updated_at DESC, skill_name, id
            "#,
        )
        .bind(sector)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_survey(&self, user_id: Uuid) -> DbResult<Option<LearnerSurvey>> {
        let survey =
            sqlx::query_as::<_, LearnerSurvey>("SELECT * FROM learner_surveys WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(survey)
    }

    async fn upsert_survey(&self, user_id: Uuid, answers: SurveyAnswers) -> DbResult<LearnerSurvey> {
        let survey = sqlx::query_as::<_, LearnerSurvey>(
            r#"
            INSERT INTO learner_surveys
                (user_id, academic_background, prior_skills_freeform, socio_economic_context,
                 learning_pace, aspirations, prior_skill_ids)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE
            SET academic_background = EXCLUDED.academic_background,
                prior_skills_freeform = EXCLUDED.prior_skills_freeform,
                socio_economic_context = EXCLUDED.socio_economic_context,
                learning_pace = EXCLUDED.learning_pace,
                aspirations = EXCLUDED.aspirations,
                prior_skill_ids = EXCLUDED.prior_skill_ids,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&answers.academic_background)
        .bind(&answers.prior_skills_freeform)
        .bind(&answers.socio_economic_context)
        .bind(answers.learning_pace)
        .bind(&answers.aspirations)
        .bind(&answers.prior_skill_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(survey)
    }

    async fn append_analysis(&self, analysis: NewAnalysis) -> DbResult<AiAnalysis> {
        let row = sqlx::query_as::<_, AiAnalysis>(
            r#"
            INSERT INTO ai_analysis (user_id, analysis_type, input, output, confidence)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(analysis.user_id)
        .bind(analysis.analysis_type)
        .bind(&analysis.input)
        .bind(&analysis.output)
        .bind(analysis.confidence)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_analyses(
        &self,
        user_id: Uuid,
        kind: Option<AnalysisType>,
    ) -> DbResult<Vec<AiAnalysis>> {
        let rows = sqlx::query_as::<_, AiAnalysis>(
            r#"
            SELECT * FROM ai_analysis
            WHERE user_id = $1
              AND ($2::analysis_type IS NULL OR analysis_type = $2)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_qualifications(&self) -> DbResult<Vec<Qualification>> {
        let rows = sqlx::query_as::<_, Qualification>(
            "SELECT id, code, title, sector, nsqf_level, description \
             FROM ncvet_qualifications ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_training_programs(&self) -> DbResult<Vec<TrainingProgram>> {
        let rows = sqlx::query_as::<_, TrainingProgram>(
            "SELECT id, title, provider, mode, duration, nsqf_level, sector, qualification_codes, \
             is_certified, description FROM training_programs ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_job_roles(&self) -> DbResult<Vec<JobRole>> {
        let rows = sqlx::query_as::<_, JobRole>(
            "SELECT id, title, sector, nsqf_level, qualification_codes, description, salary_range, \
             demand_level FROM job_roles ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
