//! Learner dashboard aggregates, computed from already-loaded rows.

use crate::domain::models::{EarnedAchievement, Enrollment, EnrollmentStatus, LearningPathway, UserSkill};
use crate::services::ai::ProgressSummary;
use serde::Serialize;

/// Skill average is discounted to estimate fit against industry demand.
const INDUSTRY_ALIGNMENT_FACTOR: f64 = 0.85;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub total_enrollments: usize,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    pub total_pathways: usize,
    pub total_skills: usize,
    pub badges_earned: usize,
    pub average_progress: i64,
    pub average_skill_score: i64,
    pub industry_alignment: i64,
}

fn mean(values: impl Iterator<Item = i32>) -> f64 {
    let (sum, count) = values.fold((0i64, 0i64), |(s, c), v| (s + v as i64, c + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

pub fn summarize(
    enrollments: &[Enrollment],
    pathways: &[LearningPathway],
    user_skills: &[UserSkill],
    badges: &[EarnedAchievement],
) -> DashboardAnalytics {
    let completed = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Completed)
        .count();
    let in_progress = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::InProgress)
        .count();
    let avg_progress = mean(enrollments.iter().map(|e| e.progress));
    let avg_skill = mean(user_skills.iter().map(|s| s.proficiency_score));

    DashboardAnalytics {
        total_enrollments: enrollments.len(),
        completed_courses: completed,
        in_progress_courses: in_progress,
        total_pathways: pathways.len(),
        total_skills: user_skills.len(),
        badges_earned: badges.len(),
        average_progress: avg_progress.round() as i64,
        average_skill_score: avg_skill.round() as i64,
        industry_alignment: (avg_skill * INDUSTRY_ALIGNMENT_FACTOR).round() as i64,
    }
}

/// The learning-progress block handed to career guidance.
pub fn progress_summary(enrollments: &[Enrollment], user_skills: &[UserSkill]) -> ProgressSummary {
    ProgressSummary {
        completed_courses: enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Completed)
            .count() as i64,
        total_skills: user_skills.len() as i64,
        average_score: mean(user_skills.iter().map(|s| s.proficiency_score)).round() as i64,
    }
}
