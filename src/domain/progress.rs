use crate::domain::models::{Course, Enrollment, EnrollmentStatus, LearningPathway};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

pub const COMPLETE: i32 = 100;

/// Status and completion stamp implied by a progress value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub progress: i32,
    pub status: EnrollmentStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

pub fn derive_enrollment_state(progress: i32, now: DateTime<Utc>) -> ProgressState {
    let progress = progress.clamp(0, COMPLETE);
    let (status, completed_at) = if progress >= COMPLETE {
        (EnrollmentStatus::Completed, Some(now))
    } else if progress > 0 {
        (EnrollmentStatus::InProgress, None)
    } else {
        (EnrollmentStatus::Enrolled, None)
    };
    ProgressState {
        progress,
        status,
        completed_at,
    }
}

/// Percentage of a pathway's course references that point at completed courses.
///
/// References are either course ids or course titles (AI-generated pathways store
/// titles); titles are compared case-insensitively.
pub fn pathway_progress(
    pathway: &LearningPathway,
    enrollments: &[Enrollment],
    courses: &[Course],
) -> i32 {
    if pathway.course_refs.is_empty() {
        return pathway.progress;
    }

    let completed: HashSet<Uuid> = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Completed)
        .map(|e| e.course_id)
        .collect();

    let done = pathway
        .course_refs
        .iter()
        .filter(|reference| {
            resolve_course(reference, courses)
                .map(|course| completed.contains(&course.id))
                .unwrap_or(false)
        })
        .count();

    ((done * 100) / pathway.course_refs.len()) as i32
}

pub fn resolve_course<'a>(reference: &str, courses: &'a [Course]) -> Option<&'a Course> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return courses.iter().find(|c| c.id == id);
    }
    let lowered = reference.to_lowercase();
    courses.iter().find(|c| c.title.to_lowercase() == lowered)
}
