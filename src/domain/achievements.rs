use crate::domain::models::Achievement;
use serde::Serialize;

/// Counters an achievement requirement can refer to.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LearnerStats {
    pub courses_completed: i64,
    pub skills_assessed: i64,
    pub pathways_created: i64,
}

/// Every key present in `requirements` must be met. Unknown keys never match,
/// and an achievement without requirements is never awarded automatically.
pub fn is_earned(achievement: &Achievement, stats: &LearnerStats) -> bool {
    let Some(requirements) = achievement.requirements.as_ref().and_then(|r| r.as_object()) else {
        return false;
    };
    if requirements.is_empty() {
        return false;
    }

    requirements.iter().all(|(key, threshold)| {
        let Some(threshold) = threshold.as_i64() else {
            return false;
        };
        let value = match key.as_str() {
            "coursesCompleted" => stats.courses_completed,
            "skillsAssessed" => stats.skills_assessed,
            "pathwaysCreated" => stats.pathways_created,
            _ => return false,
        };
        value >= threshold
    })
}
