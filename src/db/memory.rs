//! In-process [`Repository`] used by the handler and service tests.
//!
//! Mirrors the Postgres constraints the handlers rely on: unique emails and
//! enrollments, upsert-by-key for user skills and surveys, insert-if-absent
//! awards, and the same list orderings.

use super::{DbError, DbResult, Repository};
use crate::domain::models::{
    Achievement, AiAnalysis, AnalysisType, Course, CourseFilter, EarnedAchievement, Enrollment,
    IndustryTrend, JobRole, LearnerSurvey, LearningPathway, NewAnalysis, NewPathway, NewUser,
    ProfileChanges, ProficiencyLevel, Qualification, Skill, SurveyAnswers, TrainingProgram, User,
    UserSkill,
};
use crate::domain::progress::derive_enrollment_state;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    skills: Vec<Skill>,
    user_skills: Vec<UserSkill>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    pathways: Vec<LearningPathway>,
    achievements: Vec<Achievement>,
    user_achievements: Vec<(Uuid, Uuid, chrono::DateTime<Utc>)>,
    trends: Vec<IndustryTrend>,
    surveys: Vec<LearnerSurvey>,
    analyses: Vec<AiAnalysis>,
    qualifications: Vec<Qualification>,
    programs: Vec<TrainingProgram>,
    job_roles: Vec<JobRole>,
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self.tables.lock().expect("memory repository poisoned");
        f(&mut guard)
    }

    /// Successive calls produce strictly increasing timestamps so ordering
    /// assertions do not depend on clock resolution.
    fn stamp(tables: &Tables) -> chrono::DateTime<Utc> {
        let count = tables.users.len()
            + tables.user_skills.len()
            + tables.enrollments.len()
            + tables.pathways.len()
            + tables.user_achievements.len()
            + tables.analyses.len()
            + tables.surveys.len();
        Utc::now() + Duration::milliseconds(count as i64)
    }

    pub fn add_skill(&self, name: &str, category: &str) -> Skill {
        let skill = Skill {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
            nsqf_level: Some(5),
            description: None,
            industry_demand: Some(90.0),
            created_at: Utc::now(),
        };
        self.with(|t| t.skills.push(skill.clone()));
        skill
    }

    pub fn add_course(
        &self,
        title: &str,
        description: &str,
        provider: &str,
        category: &str,
        level: ProficiencyLevel,
        nsqf_level: i32,
    ) -> Course {
        let course = self.with(|t| Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: Some(description.to_string()),
            provider: provider.to_string(),
            duration: Some("8 weeks".to_string()),
            nsqf_level: Some(nsqf_level),
            skill_level: Some(level),
            category: category.to_string(),
            thumbnail_url: None,
            tags: vec![],
            is_certified: true,
            created_at: Utc::now() + Duration::milliseconds(t.courses.len() as i64),
        });
        self.with(|t| t.courses.push(course.clone()));
        course
    }

    pub fn add_achievement(&self, title: &str, requirements: serde_json::Value) -> Achievement {
        let achievement = Achievement {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            icon: "trophy".to_string(),
            category: "learning".to_string(),
            points: 50,
            requirements: Some(requirements),
            created_at: Utc::now(),
        };
        self.with(|t| t.achievements.push(achievement.clone()));
        achievement
    }

    pub fn add_trend(&self, sector: &str, skill_name: &str, growth: f64) -> IndustryTrend {
        let trend = self.with(|t| IndustryTrend {
            id: Uuid::new_v4(),
            sector: sector.to_string(),
            skill_name: skill_name.to_string(),
            demand_growth: Some(growth),
            salary_range: Some("4-8 LPA".to_string()),
            job_count: Some(1200),
            location: Some("Bengaluru".to_string()),
            updated_at: Utc::now() + Duration::milliseconds(t.trends.len() as i64),
        });
        self.with(|t| t.trends.push(trend.clone()));
        trend
    }

    pub fn add_qualification(&self, code: &str, title: &str) -> Qualification {
        let qualification = Qualification {
            id: Uuid::new_v4(),
            code: code.to_string(),
            title: title.to_string(),
            sector: "Electronics".to_string(),
            nsqf_level: 4,
            description: None,
        };
        self.with(|t| t.qualifications.push(qualification.clone()));
        qualification
    }

    pub fn add_training_program(&self, title: &str, codes: &[&str]) -> TrainingProgram {
        let program = TrainingProgram {
            id: Uuid::new_v4(),
            title: title.to_string(),
            provider: "Skill India".to_string(),
            mode: "offline".to_string(),
            duration: "3 months".to_string(),
            nsqf_level: 4,
            sector: "Electronics".to_string(),
            qualification_codes: codes.iter().map(|c| c.to_string()).collect(),
            is_certified: true,
            description: None,
        };
        self.with(|t| t.programs.push(program.clone()));
        program
    }

    pub fn add_job_role(&self, title: &str, codes: &[&str]) -> JobRole {
        let role = JobRole {
            id: Uuid::new_v4(),
            title: title.to_string(),
            sector: "Electronics".to_string(),
            nsqf_level: 4,
            qualification_codes: codes.iter().map(|c| c.to_string()).collect(),
            description: None,
            salary_range: Some("2-4 LPA".to_string()),
            demand_level: Some("high".to_string()),
        };
        self.with(|t| t.job_roles.push(role.clone()));
        role
    }

    pub fn user_skill_rows(&self, user_id: Uuid, skill_id: Uuid) -> usize {
        self.with(|t| {
            t.user_skills
                .iter()
                .filter(|r| r.user_id == user_id && r.skill_id == skill_id)
                .count()
        })
    }

    pub fn award_rows(&self, user_id: Uuid, achievement_id: Uuid) -> usize {
        self.with(|t| {
            t.user_achievements
                .iter()
                .filter(|(u, a, _)| *u == user_id && *a == achievement_id)
                .count()
        })
    }

    pub fn analyses_count(&self) -> usize {
        self.with(|t| t.analyses.len())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        self.with(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return Err(DbError::Conflict("User already exists with this email".into()));
            }
            let now = Self::stamp(t);
            let created = User {
                id: Uuid::new_v4(),
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                first_name: Some(user.first_name),
                last_name: Some(user.last_name),
                profile_image_url: None,
                survey_completed: false,
                failed_login_count: 0,
                last_login: None,
                academic_background: None,
                current_role: None,
                career_aspirations: None,
                socio_economic_context: None,
                preferred_language: "en".to_string(),
                learning_pace: Default::default(),
                created_at: now,
                updated_at: now,
            };
            t.users.push(created.clone());
            Ok(created)
        })
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn record_failed_login(&self, id: Uuid) -> DbResult<i32> {
        self.with(|t| {
            let user = t
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))?;
            user.failed_login_count += 1;
            Ok(user.failed_login_count)
        })
    }

    async fn record_successful_login(&self, id: Uuid) -> DbResult<()> {
        self.with(|t| {
            if let Some(user) = t.users.iter_mut().find(|u| u.id == id) {
                user.failed_login_count = 0;
                user.last_login = Some(Utc::now());
            }
        });
        Ok(())
    }

    async fn reset_failed_logins(&self, id: Uuid) -> DbResult<bool> {
        Ok(self.with(|t| match t.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.failed_login_count = 0;
                true
            }
            None => false,
        }))
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> DbResult<Option<User>> {
        Ok(self.with(|t| {
            let user = t.users.iter_mut().find(|u| u.id == id)?;
            if let Some(v) = changes.first_name {
                user.first_name = Some(v);
            }
            if let Some(v) = changes.last_name {
                user.last_name = Some(v);
            }
            if let Some(v) = changes.profile_image_url {
                user.profile_image_url = Some(v);
            }
            if let Some(v) = changes.academic_background {
                user.academic_background = Some(v);
            }
            if let Some(v) = changes.current_role {
                user.current_role = Some(v);
            }
            if let Some(v) = changes.career_aspirations {
                user.career_aspirations = Some(v);
            }
            if let Some(v) = changes.socio_economic_context {
                user.socio_economic_context = Some(v);
            }
            if let Some(v) = changes.preferred_language {
                user.preferred_language = v;
            }
            if let Some(v) = changes.learning_pace {
                user.learning_pace = v;
            }
            user.updated_at = Utc::now();
            Some(user.clone())
        }))
    }

    async fn mark_survey_completed(&self, id: Uuid) -> DbResult<()> {
        self.with(|t| {
            if let Some(user) = t.users.iter_mut().find(|u| u.id == id) {
                user.survey_completed = true;
            }
        });
        Ok(())
    }

    async fn list_skills(&self) -> DbResult<Vec<Skill>> {
        let mut skills = self.with(|t| t.skills.clone());
        skills.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(skills)
    }

    async fn list_skills_by_category(&self, category: &str) -> DbResult<Vec<Skill>> {
        let mut skills = self.list_skills().await?;
        skills.retain(|s| s.category == category);
        Ok(skills)
    }

    async fn find_skill(&self, id: Uuid) -> DbResult<Option<Skill>> {
        Ok(self.with(|t| t.skills.iter().find(|s| s.id == id).cloned()))
    }

    async fn list_user_skills(&self, user_id: Uuid) -> DbResult<Vec<UserSkill>> {
        let mut rows: Vec<UserSkill> = self.with(|t| {
            t.user_skills.iter().filter(|r| r.user_id == user_id).cloned().collect()
        });
        rows.sort_by(|a, b| {
            b.last_assessed
                .cmp(&a.last_assessed)
                .then(a.skill_id.cmp(&b.skill_id))
        });
        Ok(rows)
    }

    async fn upsert_user_skill(
        &self,
        user_id: Uuid,
        skill_id: Uuid,
        level: ProficiencyLevel,
        score: i32,
    ) -> DbResult<UserSkill> {
        self.with(|t| {
            if !t.skills.iter().any(|s| s.id == skill_id) {
                return Err(DbError::MissingReference("skill"));
            }
            let now = Self::stamp(t);
            if let Some(row) = t
                .user_skills
                .iter_mut()
                .find(|r| r.user_id == user_id && r.skill_id == skill_id)
            {
                row.proficiency_level = level;
                row.proficiency_score = score;
                row.last_assessed = now;
                return Ok(row.clone());
            }
            let row = UserSkill {
                id: Uuid::new_v4(),
                user_id,
                skill_id,
                proficiency_level: level,
                proficiency_score: score,
                last_assessed: now,
                created_at: now,
            };
            t.user_skills.push(row.clone());
            Ok(row)
        })
    }

    async fn list_courses(&self, filter: &CourseFilter) -> DbResult<Vec<Course>> {
        let mut courses: Vec<Course> =
            self.with(|t| t.courses.iter().filter(|c| filter.matches(c)).cloned().collect());
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.title.cmp(&b.title)));
        Ok(courses)
    }

    async fn find_course(&self, id: Uuid) -> DbResult<Option<Course>> {
        Ok(self.with(|t| t.courses.iter().find(|c| c.id == id).cloned()))
    }

    async fn list_enrollments(&self, user_id: Uuid) -> DbResult<Vec<Enrollment>> {
        let mut rows: Vec<Enrollment> = self.with(|t| {
            t.enrollments.iter().filter(|e| e.user_id == user_id).cloned().collect()
        });
        rows.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn create_enrollment(&self, user_id: Uuid, course_id: Uuid) -> DbResult<Enrollment> {
        self.with(|t| {
            if !t.courses.iter().any(|c| c.id == course_id) {
                return Err(DbError::MissingReference("course"));
            }
            if t
                .enrollments
                .iter()
                .any(|e| e.user_id == user_id && e.course_id == course_id)
            {
                return Err(DbError::Conflict("Already enrolled in this course".into()));
            }
            let row = Enrollment {
                id: Uuid::new_v4(),
                user_id,
                course_id,
                progress: 0,
                status: crate::domain::models::EnrollmentStatus::Enrolled,
                enrolled_at: Self::stamp(t),
                completed_at: None,
            };
            t.enrollments.push(row.clone());
            Ok(row)
        })
    }

    async fn update_enrollment_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
    ) -> DbResult<Option<Enrollment>> {
        let state = derive_enrollment_state(progress, Utc::now());
        Ok(self.with(|t| {
            let row = t
                .enrollments
                .iter_mut()
                .find(|e| e.user_id == user_id && e.course_id == course_id)?;
            row.progress = state.progress;
            row.status = state.status;
            row.completed_at = state.completed_at;
            Some(row.clone())
        }))
    }

    async fn list_pathways(&self, user_id: Uuid) -> DbResult<Vec<LearningPathway>> {
        let mut rows: Vec<LearningPathway> = self.with(|t| {
            t.pathways.iter().filter(|p| p.user_id == user_id).cloned().collect()
        });
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn create_pathway(&self, pathway: NewPathway) -> DbResult<LearningPathway> {
        Ok(self.with(|t| {
            let now = Self::stamp(t);
            let row = LearningPathway {
                id: Uuid::new_v4(),
                user_id: pathway.user_id,
                title: pathway.title,
                description: pathway.description,
                target_role: pathway.target_role,
                estimated_duration: pathway.estimated_duration,
                difficulty: pathway.difficulty,
                progress: 0,
                ai_generated: pathway.ai_generated,
                course_refs: pathway.course_refs,
                created_at: now,
                updated_at: now,
            };
            t.pathways.push(row.clone());
            row
        }))
    }

    async fn update_pathway_progress(
        &self,
        user_id: Uuid,
        pathway_id: Uuid,
        progress: i32,
    ) -> DbResult<Option<LearningPathway>> {
        Ok(self.with(|t| {
            let row = t
                .pathways
                .iter_mut()
                .find(|p| p.id == pathway_id && p.user_id == user_id)?;
            row.progress = progress.clamp(0, 100);
            row.updated_at = Utc::now();
            Some(row.clone())
        }))
    }

    async fn list_achievements(&self) -> DbResult<Vec<Achievement>> {
        let mut rows = self.with(|t| t.achievements.clone());
        rows.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn list_user_achievements(&self, user_id: Uuid) -> DbResult<Vec<EarnedAchievement>> {
        let mut rows: Vec<EarnedAchievement> = self.with(|t| {
            t.user_achievements
                .iter()
                .filter(|(u, _, _)| *u == user_id)
                .filter_map(|(_, achievement_id, earned_at)| {
                    t.achievements
                        .iter()
                        .find(|a| a.id == *achievement_id)
                        .map(|a| EarnedAchievement {
                            id: a.id,
                            title: a.title.clone(),
                            description: a.description.clone(),
                            icon: a.icon.clone(),
                            category: a.category.clone(),
                            points: a.points,
                            earned_at: *earned_at,
                        })
                })
                .collect()
        });
        rows.sort_by(|a, b| b.earned_at.cmp(&a.earned_at).then(a.title.cmp(&b.title)));
        Ok(rows)
    }

    async fn award_achievement(&self, user_id: Uuid, achievement_id: Uuid) -> DbResult<bool> {
        self.with(|t| {
            if !t.achievements.iter().any(|a| a.id == achievement_id) {
                return Err(DbError::MissingReference("achievement"));
            }
            if t
                .user_achievements
                .iter()
                .any(|(u, a, _)| *u == user_id && *a == achievement_id)
            {
                return Ok(false);
            }
            let now = Self::stamp(t);
            t.user_achievements.push((user_id, achievement_id, now));
            Ok(true)
        })
    }

    async fn list_industry_trends(&self, sector: Option<&str>) -> DbResult<Vec<IndustryTrend>> {
        let mut rows: Vec<IndustryTrend> = self.with(|t| {
            t.trends
                .iter()
                .filter(|trend| sector.map_or(true, |s| trend.sector == s))
                .cloned()
                .collect()
        });
        rows.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(a.skill_name.cmp(&b.skill_name))
        });
        Ok(rows)
    }

    async fn find_survey(&self, user_id: Uuid) -> DbResult<Option<LearnerSurvey>> {
        Ok(self.with(|t| t.surveys.iter().find(|s| s.user_id == user_id).cloned()))
    }

    async fn upsert_survey(&self, user_id: Uuid, answers: SurveyAnswers) -> DbResult<LearnerSurvey> {
        Ok(self.with(|t| {
            let now = Self::stamp(t);
            if let Some(survey) = t.surveys.iter_mut().find(|s| s.user_id == user_id) {
                survey.academic_background = answers.academic_background;
                survey.prior_skills_freeform = answers.prior_skills_freeform;
                survey.socio_economic_context = answers.socio_economic_context;
                survey.learning_pace = answers.learning_pace;
                survey.aspirations = answers.aspirations;
                survey.prior_skill_ids = answers.prior_skill_ids;
                survey.updated_at = now;
                return survey.clone();
            }
            let survey = LearnerSurvey {
                id: Uuid::new_v4(),
                user_id,
                academic_background: answers.academic_background,
                prior_skills_freeform: answers.prior_skills_freeform,
                socio_economic_context: answers.socio_economic_context,
                learning_pace: answers.learning_pace,
                aspirations: answers.aspirations,
                prior_skill_ids: answers.prior_skill_ids,
                created_at: now,
                updated_at: now,
            };
            t.surveys.push(survey.clone());
            survey
        }))
    }

    async fn append_analysis(&self, analysis: NewAnalysis) -> DbResult<AiAnalysis> {
        Ok(self.with(|t| {
            let row = AiAnalysis {
                id: Uuid::new_v4(),
                user_id: analysis.user_id,
                analysis_type: analysis.analysis_type,
                input: analysis.input,
                output: analysis.output,
                confidence: analysis.confidence,
                created_at: Self::stamp(t),
            };
            t.analyses.push(row.clone());
            row
        }))
    }

    async fn list_analyses(
        &self,
        user_id: Uuid,
        kind: Option<AnalysisType>,
    ) -> DbResult<Vec<AiAnalysis>> {
        let mut rows: Vec<AiAnalysis> = self.with(|t| {
            t.analyses
                .iter()
                .filter(|a| a.user_id == user_id && kind.map_or(true, |k| a.analysis_type == k))
                .cloned()
                .collect()
        });
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn list_qualifications(&self) -> DbResult<Vec<Qualification>> {
        let mut rows = self.with(|t| t.qualifications.clone());
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn list_training_programs(&self) -> DbResult<Vec<TrainingProgram>> {
        let mut rows = self.with(|t| t.programs.clone());
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }

    async fn list_job_roles(&self) -> DbResult<Vec<JobRole>> {
        let mut rows = self.with(|t| t.job_roles.clone());
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UserRole;

    async fn learner(repo: &MemoryRepository) -> User {
        repo.create_user(NewUser {
            email: "learner@example.com".into(),
            password_hash: "hash".into(),
            role: UserRole::Learner,
            first_name: "Asha".into(),
            last_name: "Rao".into(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn skill_upsert_keeps_one_row_with_latest_score() {
        let repo = MemoryRepository::new();
        let user = learner(&repo).await;
        let skill = repo.add_skill("Python Programming", "Programming");

        repo.upsert_user_skill(user.id, skill.id, ProficiencyLevel::Beginner, 30)
            .await
            .unwrap();
        let latest = repo
            .upsert_user_skill(user.id, skill.id, ProficiencyLevel::Intermediate, 65)
            .await
            .unwrap();

        assert_eq!(repo.user_skill_rows(user.id, skill.id), 1);
        assert_eq!(latest.proficiency_score, 65);
        let rows = repo.list_user_skills(user.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].proficiency_level, ProficiencyLevel::Intermediate);
    }

    #[tokio::test]
    async fn repeated_award_is_a_no_op() {
        let repo = MemoryRepository::new();
        let user = learner(&repo).await;
        let badge = repo.add_achievement("First Steps", serde_json::json!({"coursesCompleted": 1}));

        assert!(repo.award_achievement(user.id, badge.id).await.unwrap());
        assert!(!repo.award_achievement(user.id, badge.id).await.unwrap());
        assert!(!repo.award_achievement(user.id, badge.id).await.unwrap());

        assert_eq!(repo.award_rows(user.id, badge.id), 1);
        assert_eq!(repo.list_user_achievements(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn enrollment_status_follows_progress() {
        let repo = MemoryRepository::new();
        let user = learner(&repo).await;
        let course = repo.add_course(
            "Python for Data Analysis",
            "pandas",
            "DataCamp",
            "Data Analytics",
            ProficiencyLevel::Beginner,
            4,
        );
        repo.create_enrollment(user.id, course.id).await.unwrap();

        let done = repo
            .update_enrollment_progress(user.id, course.id, 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, crate::domain::models::EnrollmentStatus::Completed);
        assert!(done.completed_at.is_some());

        let reverted = repo
            .update_enrollment_progress(user.id, course.id, 50)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reverted.status, crate::domain::models::EnrollmentStatus::InProgress);
        assert!(reverted.completed_at.is_none());
    }

    #[tokio::test]
    async fn pathway_progress_is_owner_scoped() {
        let repo = MemoryRepository::new();
        let owner = learner(&repo).await;
        let pathway = repo
            .create_pathway(NewPathway {
                user_id: owner.id,
                title: "Data Analyst".into(),
                description: None,
                target_role: None,
                estimated_duration: None,
                difficulty: None,
                ai_generated: false,
                course_refs: vec![],
            })
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        assert!(repo
            .update_pathway_progress(stranger, pathway.id, 80)
            .await
            .unwrap()
            .is_none());
        let updated = repo
            .update_pathway_progress(owner.id, pathway.id, 80)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.progress, 80);
    }
}
