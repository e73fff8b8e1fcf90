//! Prompt text for the advisory model.
//!
//! Prompts carry only the profile fields the model needs; identifiers other
//! than course ids never leave the process.

use crate::domain::models::{
    Course, IndustryTrend, JobRole, LearnerSurvey, Qualification, Skill, TrainingProgram, User,
    UserSkill,
};
use crate::services::ai::{ProgressSummary, SkillGapAnalysis};
use std::fmt::Write as _;

pub const SKILL_GAP_SYSTEM: &str = "You are an expert career counselor and skill assessment \
specialist. Provide detailed, actionable skill gap analysis for vocational training aligned \
with NSQF standards. Reply with a single JSON object and nothing else.";

pub const PATHWAY_SYSTEM: &str = "You are an expert learning path designer with deep knowledge \
of the NSQF framework and industry requirements. Create practical, achievable learning \
pathways. Reply with a single JSON object and nothing else.";

pub const GUIDANCE_SYSTEM: &str = "You are a senior career counselor with expertise in Indian \
job market trends and vocational training. Provide practical, actionable career guidance. \
Reply with a single JSON object and nothing else.";

pub const RECOMMEND_SYSTEM: &str = "You are an AI learning advisor. Recommend courses that best \
match the learner's skill level, career goals and learning preferences. Reply with a single \
JSON object and nothing else.";

pub const CHAT_SYSTEM: &str = "You are Vidya Varadhi, a knowledgeable and supportive career \
guidance assistant specializing in Indian vocational education and NSQF-aligned career paths. \
You help learners navigate their career journey with empathy and practical advice.";

const NOT_SPECIFIED: &str = "Not specified";

fn or_unspecified(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_SPECIFIED)
}

fn skill_name<'a>(skills: &'a [Skill], user_skill: &UserSkill) -> &'a str {
    skills
        .iter()
        .find(|s| s.id == user_skill.skill_id)
        .map(|s| s.name.as_str())
        .unwrap_or("Unknown")
}

pub fn skill_gap(user: &User, user_skills: &[UserSkill], catalog: &[Skill], target_role: &str) -> String {
    let mut prompt = format!(
        "Analyze the skill gap for a learner aspiring to become a {target_role}.\n\n\
         User Profile:\n\
         - Academic Background: {}\n\
         - Current Role: {}\n\
         - Career Aspirations: {}\n\
         - Learning Pace: {}\n\n\
         Current Skills:\n",
        or_unspecified(user.academic_background.as_deref()),
        or_unspecified(user.current_role.as_deref()),
        or_unspecified(user.career_aspirations.as_deref()),
        user.learning_pace.as_str(),
    );
    if user_skills.is_empty() {
        prompt.push_str("- None assessed yet\n");
    }
    for us in user_skills {
        let _ = writeln!(
            prompt,
            "- {}: {} ({}/100)",
            skill_name(catalog, us),
            us.proficiency_level.as_str(),
            us.proficiency_score
        );
    }
    prompt.push_str("\nAvailable Skills in System:\n");
    for skill in catalog {
        let _ = writeln!(prompt, "- {} ({})", skill.name, skill.category);
    }
    prompt.push_str(
        r#"
Return JSON with exactly this structure:
{
  "skillGaps": [
    {
      "skillName": "string",
      "currentLevel": "beginner|intermediate|advanced|none",
      "requiredLevel": "beginner|intermediate|advanced",
      "priority": "high|medium|low",
      "recommendations": ["string"]
    }
  ],
  "overallScore": 0-100,
  "strengths": ["string"],
  "improvementAreas": ["string"],
  "careerReadiness": 0-100
}"#,
    );
    prompt
}

pub fn pathway(user: &User, analysis: &SkillGapAnalysis, courses: &[Course], target_role: &str) -> String {
    let mut gaps: Vec<_> = analysis.skill_gaps.iter().collect();
    gaps.sort_by_key(|g| g.priority);
    let gap_lines: Vec<String> = gaps
        .iter()
        .map(|g| {
            format!(
                "{} ({} -> {}, priority: {})",
                g.skill_name,
                g.current_level,
                g.required_level,
                g.priority.as_str()
            )
        })
        .collect();

    let mut prompt = format!(
        "Generate a personalized learning pathway for a {target_role} aspirant.\n\n\
         User Profile:\n\
         - Academic Background: {}\n\
         - Learning Pace: {}\n\
         - Career Aspirations: {}\n\n\
         Skill Gap Analysis (highest priority first):\n\
         - Overall Score: {}/100\n\
         - Career Readiness: {}/100\n\
         - Key Skill Gaps: {}\n\
         - Strengths: {}\n\
         - Improvement Areas: {}\n\n\
         Available Courses:\n",
        or_unspecified(user.academic_background.as_deref()),
        user.learning_pace.as_str(),
        or_unspecified(user.career_aspirations.as_deref()),
        analysis.overall_score.round(),
        analysis.career_readiness.round(),
        gap_lines.join(", "),
        analysis.strengths.join(", "),
        analysis.improvement_areas.join(", "),
    );
    for course in courses.iter().take(50) {
        let _ = writeln!(
            prompt,
            "- {} by {} ({}, NSQF Level {}, Duration: {})",
            course.title,
            course.provider,
            course.skill_level.map(|l| l.as_str()).unwrap_or("unrated"),
            course
                .nsqf_level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            course.duration.as_deref().unwrap_or("self-paced"),
        );
    }
    prompt.push_str(
        r#"
Use course titles exactly as listed. Return JSON with exactly this structure:
{
  "title": "string",
  "description": "string",
  "duration": "string (e.g. '6 months')",
  "difficulty": "beginner|intermediate|advanced",
  "courses": [
    {"title": "string", "provider": "string", "duration": "string", "nsqfLevel": 1-10, "priority": 1-10}
  ],
  "milestones": ["string"],
  "expectedOutcomes": ["string"]
}

The pathway must be aligned with NSQF standards, progress from basics to advanced,
stay industry-relevant, suit the learner's pace and background, and focus on the
highest-priority skill gaps first."#,
    );
    prompt
}

pub fn career_guidance(user: &User, trends: &[IndustryTrend], progress: &ProgressSummary) -> String {
    let mut prompt = format!(
        "Provide comprehensive career guidance for a learner.\n\n\
         User Profile:\n\
         - Academic Background: {}\n\
         - Current Role: {}\n\
         - Career Aspirations: {}\n\
         - Location Context: {}\n\n\
         Learning Progress:\n\
         - Completed Courses: {}\n\
         - Total Skills Assessed: {}\n\
         - Average Skill Score: {}/100\n\n\
         Industry Trends:\n",
        or_unspecified(user.academic_background.as_deref()),
        or_unspecified(user.current_role.as_deref()),
        or_unspecified(user.career_aspirations.as_deref()),
        or_unspecified(user.socio_economic_context.as_deref()),
        progress.completed_courses,
        progress.total_skills,
        progress.average_score,
    );
    for trend in trends.iter().take(10) {
        let _ = writeln!(
            prompt,
            "- {} in {}: {}% growth, Salary: {}, Jobs: {}",
            trend.skill_name,
            trend.sector,
            trend.demand_growth.unwrap_or_default(),
            trend.salary_range.as_deref().unwrap_or("n/a"),
            trend.job_count.unwrap_or_default(),
        );
    }
    prompt.push_str(
        r#"
Return JSON with exactly this structure:
{
  "careerAdvice": ["string"],
  "industryInsights": ["string"],
  "nextSteps": ["string"],
  "salaryExpectations": "string",
  "jobMarketOutlook": "string"
}"#,
    );
    prompt
}

pub fn recommendations(user: &User, user_skills: &[UserSkill], courses: &[Course], limit: usize) -> String {
    let mut prompt = format!(
        "Recommend the most suitable courses for this learner.\n\n\
         User Profile:\n\
         - Academic Background: {}\n\
         - Career Aspirations: {}\n\
         - Learning Pace: {}\n\n\
         Current Skills:\n",
        or_unspecified(user.academic_background.as_deref()),
        or_unspecified(user.career_aspirations.as_deref()),
        user.learning_pace.as_str(),
    );
    for us in user_skills {
        let _ = writeln!(
            prompt,
            "- Skill {}: {} ({}/100)",
            us.skill_id,
            us.proficiency_level.as_str(),
            us.proficiency_score
        );
    }
    prompt.push_str("\nAvailable Courses:\n");
    for course in courses {
        let _ = writeln!(
            prompt,
            "ID: {} - {} ({}, NSQF {}, {})",
            course.id,
            course.title,
            course.skill_level.map(|l| l.as_str()).unwrap_or("unrated"),
            course
                .nsqf_level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            course.category,
        );
    }
    let _ = write!(
        prompt,
        r#"
Return JSON with the recommended course IDs, most relevant first:
{{
  "recommendedCourseIds": ["id", "..."],
  "reasoning": "string"
}}

Recommend at most {limit} courses."#
    );
    prompt
}

/// Everything the career chatbot is told about the learner and the
/// qualification framework.
pub struct ChatContext<'a> {
    pub survey: &'a LearnerSurvey,
    pub user_skills: &'a [UserSkill],
    pub skills: &'a [Skill],
    pub qualifications: &'a [Qualification],
    pub programs: &'a [TrainingProgram],
    pub job_roles: &'a [JobRole],
}

pub fn career_chat(message: &str, ctx: &ChatContext<'_>) -> String {
    let mut prompt = format!(
        "Help this learner explore career paths based on NCVET qualifications and NSQF levels.\n\n\
         User Profile:\n\
         - Academic Background: {}\n\
         - Career Aspirations: {}\n\
         - Learning Pace: {}\n\
         - Socio-Economic Context: {}\n\
         - Prior Skills: {}\n",
        ctx.survey.academic_background,
        ctx.survey.aspirations,
        ctx.survey.learning_pace.as_str(),
        or_unspecified(ctx.survey.socio_economic_context.as_deref()),
        or_unspecified(ctx.survey.prior_skills_freeform.as_deref()),
    );
    for us in ctx.user_skills {
        let _ = writeln!(
            prompt,
            "- Assessed: {} ({}, {}/100)",
            skill_name(ctx.skills, us),
            us.proficiency_level.as_str(),
            us.proficiency_score
        );
    }

    prompt.push_str("\nAvailable NCVET Qualifications:\n");
    for q in ctx.qualifications {
        let _ = writeln!(prompt, "- {}: {} (NSQF Level {}, {})", q.code, q.title, q.nsqf_level, q.sector);
    }
    prompt.push_str("\nAvailable Training Programs:\n");
    for p in ctx.programs {
        let _ = writeln!(
            prompt,
            "- {} by {} ({}, NSQF Level {})",
            p.title, p.provider, p.duration, p.nsqf_level
        );
    }
    prompt.push_str("\nJob Roles:\n");
    for j in ctx.job_roles {
        let _ = writeln!(
            prompt,
            "- {} in {} (NSQF Level {}, Salary: {})",
            j.title,
            j.sector,
            j.nsqf_level,
            j.salary_range.as_deref().unwrap_or("n/a")
        );
    }

    let _ = write!(
        prompt,
        "\nUser Message: \"{message}\"\n\n\
         Give guidance that fits their background and aspirations, cites NCVET qualification \
         codes where relevant, suggests suitable NSQF levels and training programs from the \
         lists above, and mentions salary ranges and job demand. Use simple, encouraging \
         language suited to Indian learners. Keep the reply under 300 words."
    );
    prompt
}
