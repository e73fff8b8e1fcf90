//! Follow-up writes after learning activity: pathway progress and badges.
//!
//! These run after the triggering write has committed and are not atomic
//! with it.

use crate::db::{DbResult, Repository};
use crate::domain::achievements::{is_earned, LearnerStats};
use crate::domain::models::{CourseFilter, EnrollmentStatus};
use crate::domain::progress::pathway_progress;
use uuid::Uuid;

pub async fn learner_stats(repo: &dyn Repository, user_id: Uuid) -> DbResult<LearnerStats> {
    let enrollments = repo.list_enrollments(user_id).await?;
    let skills = repo.list_user_skills(user_id).await?;
    let pathways = repo.list_pathways(user_id).await?;
    Ok(LearnerStats {
        courses_completed: enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Completed)
            .count() as i64,
        skills_assessed: skills.len() as i64,
        pathways_created: pathways.len() as i64,
    })
}

/// Awards every catalog achievement the user now qualifies for and returns
/// the titles of the ones that were newly written.
pub async fn evaluate_achievements(repo: &dyn Repository, user_id: Uuid) -> DbResult<Vec<String>> {
    let stats = learner_stats(repo, user_id).await?;
    let mut awarded = Vec::new();
    for achievement in repo.list_achievements().await? {
        if is_earned(&achievement, &stats) && repo.award_achievement(user_id, achievement.id).await? {
            tracing::info!(%user_id, achievement = %achievement.title, "Achievement awarded");
            awarded.push(achievement.title);
        }
    }
    Ok(awarded)
}

/// Recomputes progress for the user's pathways that reference catalog courses.
/// Returns how many pathways changed.
pub async fn sync_pathway_progress(repo: &dyn Repository, user_id: Uuid) -> DbResult<usize> {
    let pathways = repo.list_pathways(user_id).await?;
    if pathways.iter().all(|p| p.course_refs.is_empty()) {
        return Ok(0);
    }
    let enrollments = repo.list_enrollments(user_id).await?;
    let courses = repo.list_courses(&CourseFilter::default()).await?;

    let mut changed = 0;
    for pathway in pathways.iter().filter(|p| !p.course_refs.is_empty()) {
        let progress = pathway_progress(pathway, &enrollments, &courses);
        if progress != pathway.progress {
            repo.update_pathway_progress(user_id, pathway.id, progress).await?;
            changed += 1;
        }
    }
    Ok(changed)
}
