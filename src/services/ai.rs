use crate::db::{DbError, Repository};
use crate::domain::models::{
    AnalysisType, Course, IndustryTrend, NewAnalysis, Principal, ProficiencyLevel, Skill, User,
    UserSkill,
};
use crate::services::prompts::{self, ChatContext};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequestArgs, Role,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use uuid::Uuid;

const MAX_RETRIES: u64 = 3;

const SKILL_GAP_CONFIDENCE: f64 = 0.85;
const PATHWAY_CONFIDENCE: f64 = 0.90;
const GUIDANCE_CONFIDENCE: f64 = 0.88;
const RECOMMENDATION_CONFIDENCE: f64 = 0.80;
const CHAT_CONFIDENCE: f64 = 0.85;

const MAX_CHAT_SUGGESTIONS: usize = 3;

static QUALIFICATION_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{3}/Q\d{4}").expect("qualification code pattern"));

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("model provider error: {0}")]
    Provider(String),
    #[error("model call timed out")]
    Timeout,
    #[error("unparseable model output: {0}")]
    Parse(String),
    #[error("failed to record analysis: {0}")]
    Storage(#[from] DbError),
}

/// A chat-completion backend. Returns the raw text of the first choice.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AdvisoryError>;
}

pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AdvisoryError> {
        let mut retries = 0;
        loop {
            let messages = vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    role: Role::System,
                    content: system.to_string(),
                    name: None,
                }),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    role: Role::User,
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                }),
            ];

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages)
                .build()
                .map_err(|e| AdvisoryError::Provider(e.to_string()))?;

            match self.client.chat().create(request).await {
                Ok(resp) => {
                    return resp
                        .choices
                        .first()
                        .and_then(|c| c.message.content.clone())
                        .filter(|content| !content.trim().is_empty())
                        .ok_or_else(|| AdvisoryError::Parse("empty completion".to_string()));
                }
                Err(err) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(AdvisoryError::Provider(err.to_string()));
                    }
                    tracing::warn!(attempt = retries, "OpenAI request failed, retrying: {}", err);
                    sleep(Duration::from_millis(500 * retries)).await;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GapPriority {
    High,
    Medium,
    Low,
}

impl GapPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapPriority::High => "high",
            GapPriority::Medium => "medium",
            GapPriority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub skill_name: String,
    pub current_level: String,
    pub required_level: String,
    pub priority: GapPriority,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapAnalysis {
    #[serde(default)]
    pub skill_gaps: Vec<SkillGap>,
    pub overall_score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
    pub career_readiness: f64,
}

impl SkillGapAnalysis {
    fn clamp_scores(mut self) -> Self {
        self.overall_score = self.overall_score.clamp(0.0, 100.0);
        self.career_readiness = self.career_readiness.clamp(0.0, 100.0);
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPathway {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    courses: Vec<RawPathwayCourse>,
    #[serde(default)]
    milestones: Vec<String>,
    #[serde(default)]
    expected_outcomes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPathwayCourse {
    title: String,
    provider: Option<String>,
    duration: Option<String>,
    nsqf_level: Option<f64>,
    priority: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PathwayCourse {
    pub title: String,
    pub provider: Option<String>,
    pub duration: Option<String>,
    pub nsqf_level: Option<i32>,
    pub priority: i32,
    /// Set when the title matched a catalog course.
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayDraft {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub difficulty: String,
    pub courses: Vec<PathwayCourse>,
    pub milestones: Vec<String>,
    pub expected_outcomes: Vec<String>,
}

impl PathwayDraft {
    /// References stored on the persisted pathway: catalog ids where matched,
    /// the model's title otherwise.
    pub fn course_refs(&self) -> Vec<String> {
        self.courses
            .iter()
            .map(|c| c.course_id.map(|id| id.to_string()).unwrap_or_else(|| c.title.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerGuidance {
    #[serde(default)]
    pub career_advice: Vec<String>,
    #[serde(default)]
    pub industry_insights: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub salary_expectations: String,
    #[serde(default)]
    pub job_market_outlook: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub completed_courses: i64,
    pub total_skills: i64,
    pub average_score: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    #[serde(default)]
    recommended_course_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSuggestion {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub code: String,
    pub title: String,
    pub nsqf_level: i32,
    pub sector: String,
    pub related_program: Option<String>,
    pub related_job_role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub suggestions: Vec<ChatSuggestion>,
    pub conversation_id: String,
}

/// Wraps the chat model with prompting, parsing and the analysis audit log.
pub struct AdvisoryService {
    model: Arc<dyn ChatModel>,
    repo: Arc<dyn Repository>,
    timeout: Duration,
}

impl AdvisoryService {
    pub fn new(model: Arc<dyn ChatModel>, repo: Arc<dyn Repository>, timeout: Duration) -> Self {
        Self {
            model,
            repo,
            timeout,
        }
    }

    async fn ask(&self, system: &str, prompt: &str) -> Result<String, AdvisoryError> {
        match timeout(self.timeout, self.model.complete(system, prompt)).await {
            Ok(reply) => reply,
            Err(_) => Err(AdvisoryError::Timeout),
        }
    }

    async fn record(
        &self,
        user_id: Uuid,
        analysis_type: AnalysisType,
        input: serde_json::Value,
        output: serde_json::Value,
        confidence: f64,
    ) -> Result<(), AdvisoryError> {
        self.repo
            .append_analysis(NewAnalysis {
                user_id,
                analysis_type,
                input,
                output,
                confidence,
            })
            .await?;
        Ok(())
    }

    pub async fn analyze_skill_gap(
        &self,
        user: &User,
        user_skills: &[UserSkill],
        catalog: &[Skill],
        target_role: &str,
    ) -> Result<SkillGapAnalysis, AdvisoryError> {
        let prompt = prompts::skill_gap(user, user_skills, catalog, target_role);
        let raw = self.ask(prompts::SKILL_GAP_SYSTEM, &prompt).await?;
        let analysis = parse_reply::<SkillGapAnalysis>(&raw)?.clamp_scores();

        self.record(
            user.id,
            AnalysisType::SkillGap,
            json!({
                "userProfile": {
                    "academicBackground": user.academic_background,
                    "currentRole": user.current_role,
                    "careerAspirations": user.career_aspirations,
                },
                "targetRole": target_role,
                "currentSkills": user_skills.len(),
            }),
            json!(analysis),
            SKILL_GAP_CONFIDENCE,
        )
        .await?;
        Ok(analysis)
    }

    pub async fn generate_learning_pathway(
        &self,
        user: &User,
        analysis: &SkillGapAnalysis,
        catalog: &[Course],
        target_role: &str,
    ) -> Result<PathwayDraft, AdvisoryError> {
        let prompt = prompts::pathway(user, analysis, catalog, target_role);
        let raw = self.ask(prompts::PATHWAY_SYSTEM, &prompt).await?;
        let draft = normalize_pathway(parse_reply::<RawPathway>(&raw)?, catalog);

        self.record(
            user.id,
            AnalysisType::PathwayRecommendation,
            json!({
                "targetRole": target_role,
                "skillGapAnalysis": {
                    "overallScore": analysis.overall_score,
                    "careerReadiness": analysis.career_readiness,
                    "skillGapsCount": analysis.skill_gaps.len(),
                },
                "availableCoursesCount": catalog.len(),
            }),
            json!(draft),
            PATHWAY_CONFIDENCE,
        )
        .await?;
        Ok(draft)
    }

    pub async fn generate_career_guidance(
        &self,
        user: &User,
        trends: &[IndustryTrend],
        progress: ProgressSummary,
    ) -> Result<CareerGuidance, AdvisoryError> {
        let prompt = prompts::career_guidance(user, trends, &progress);
        let raw = self.ask(prompts::GUIDANCE_SYSTEM, &prompt).await?;
        let guidance = parse_reply::<CareerGuidance>(&raw)?;

        self.record(
            user.id,
            AnalysisType::CareerGuidance,
            json!({
                "userProgress": progress,
                "industryTrendsCount": trends.len(),
            }),
            json!(guidance),
            GUIDANCE_CONFIDENCE,
        )
        .await?;
        Ok(guidance)
    }

    /// Ranks catalog courses for the user. Never fails on model problems: any
    /// provider, timeout or parse failure falls back to aspiration matching.
    pub async fn recommend_courses(
        &self,
        user: &User,
        user_skills: &[UserSkill],
        catalog: &[Course],
        limit: usize,
    ) -> Result<Vec<Course>, AdvisoryError> {
        let prompt = prompts::recommendations(user, user_skills, catalog, limit);
        let ranked = match self.ask(prompts::RECOMMEND_SYSTEM, &prompt).await {
            Ok(raw) => parse_reply::<RawRecommendation>(&raw)
                .map(|r| rank_by_ids(&r.recommended_course_ids, catalog, limit)),
            Err(err) => Err(err),
        };

        match ranked {
            Ok(courses) if !courses.is_empty() => {
                let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
                self.record(
                    user.id,
                    AnalysisType::PathwayRecommendation,
                    json!({
                        "limit": limit,
                        "currentSkills": user_skills.len(),
                        "availableCoursesCount": catalog.len(),
                    }),
                    json!({ "recommendedCourseIds": ids }),
                    RECOMMENDATION_CONFIDENCE,
                )
                .await?;
                Ok(courses)
            }
            Ok(_) => {
                tracing::warn!("Model recommended no known courses, using local heuristic");
                Ok(fallback_recommendations(user, catalog, limit))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Course recommendation degraded to local heuristic");
                Ok(fallback_recommendations(user, catalog, limit))
            }
        }
    }

    pub async fn career_chat(
        &self,
        principal: &Principal,
        message: &str,
        conversation_id: Option<String>,
        ctx: &ChatContext<'_>,
    ) -> Result<ChatReply, AdvisoryError> {
        let prompt = prompts::career_chat(message, ctx);
        let response = self.ask(prompts::CHAT_SYSTEM, &prompt).await?;
        let suggestions = extract_suggestions(&response, ctx);

        self.record(
            principal.id,
            AnalysisType::CareerGuidance,
            json!({ "message": message, "conversationId": conversation_id }),
            json!({ "response": response, "suggestions": suggestions }),
            CHAT_CONFIDENCE,
        )
        .await?;

        Ok(ChatReply {
            response,
            suggestions,
            conversation_id: conversation_id
                .unwrap_or_else(|| format!("conv_{}", Uuid::new_v4().simple())),
        })
    }
}

/// Parses the first JSON object in a model reply, tolerating code fences and
/// stray prose around it.
fn parse_reply<T: DeserializeOwned>(raw: &str) -> Result<T, AdvisoryError> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if s < e => &raw[s..=e],
        _ => return Err(AdvisoryError::Parse("no JSON object in reply".to_string())),
    };
    serde_json::from_str(body).map_err(|e| AdvisoryError::Parse(e.to_string()))
}

fn level_rank(level: ProficiencyLevel) -> u8 {
    match level {
        ProficiencyLevel::Beginner => 0,
        ProficiencyLevel::Intermediate => 1,
        ProficiencyLevel::Advanced => 2,
    }
}

/// NSQF 1-4 reads as beginner, 5-6 as intermediate, 7+ as advanced.
fn nsqf_rank(nsqf: i32) -> u8 {
    match nsqf {
        i32::MIN..=4 => 0,
        5..=6 => 1,
        _ => 2,
    }
}

fn normalize_pathway(raw: RawPathway, catalog: &[Course]) -> PathwayDraft {
    let mut courses: Vec<(u8, PathwayCourse)> = raw
        .courses
        .into_iter()
        .map(|c| {
            let matched = catalog
                .iter()
                .find(|course| course.title.eq_ignore_ascii_case(c.title.trim()));
            let nsqf_level = c
                .nsqf_level
                .map(|l| l.round() as i32)
                .or_else(|| matched.and_then(|m| m.nsqf_level));
            let rank = matched
                .and_then(|m| m.skill_level.map(level_rank))
                .or_else(|| nsqf_level.map(nsqf_rank))
                .unwrap_or(3);
            let course = PathwayCourse {
                title: matched.map(|m| m.title.clone()).unwrap_or(c.title),
                provider: c.provider.or_else(|| matched.map(|m| m.provider.clone())),
                duration: c.duration.or_else(|| matched.and_then(|m| m.duration.clone())),
                nsqf_level,
                priority: c.priority.map(|p| p.round() as i32).unwrap_or(5).clamp(1, 10),
                course_id: matched.map(|m| m.id),
            };
            (rank, course)
        })
        .collect();

    courses.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then(b.priority.cmp(&a.priority)));

    PathwayDraft {
        title: raw.title,
        description: raw.description,
        duration: raw.duration,
        difficulty: raw.difficulty,
        courses: courses.into_iter().map(|(_, c)| c).collect(),
        milestones: raw.milestones,
        expected_outcomes: raw.expected_outcomes,
    }
}

fn rank_by_ids(ids: &[String], catalog: &[Course], limit: usize) -> Vec<Course> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter_map(|id| Uuid::parse_str(id.trim()).ok())
        .filter(|id| seen.insert(*id))
        .filter_map(|id| catalog.iter().find(|c| c.id == id).cloned())
        .take(limit)
        .collect()
}

fn fallback_recommendations(user: &User, catalog: &[Course], limit: usize) -> Vec<Course> {
    let aspiration = user
        .career_aspirations
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_lowercase);

    catalog
        .iter()
        .filter(|course| match &aspiration {
            Some(needle) => course
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle)),
            None => true,
        })
        .take(limit)
        .cloned()
        .collect()
}

fn extract_suggestions(response: &str, ctx: &ChatContext<'_>) -> Vec<ChatSuggestion> {
    let mut seen = HashSet::new();
    QUALIFICATION_CODE
        .find_iter(response)
        .map(|m| m.as_str())
        .filter(|code| seen.insert(*code))
        .filter_map(|code| {
            let qualification = ctx.qualifications.iter().find(|q| q.code == code)?;
            let owns = |codes: &[String]| codes.iter().any(|c| c == code);
            Some(ChatSuggestion {
                kind: "qualification",
                code: qualification.code.clone(),
                title: qualification.title.clone(),
                nsqf_level: qualification.nsqf_level,
                sector: qualification.sector.clone(),
                related_program: ctx
                    .programs
                    .iter()
                    .find(|p| owns(&p.qualification_codes))
                    .map(|p| p.title.clone()),
                related_job_role: ctx
                    .job_roles
                    .iter()
                    .find(|j| owns(&j.qualification_codes))
                    .map(|j| j.title.clone()),
            })
        })
        .take(MAX_CHAT_SUGGESTIONS)
        .collect()
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::domain::models::{LearningPace, UserRole};
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order; `None` entries and an empty queue
    /// behave like a provider outage.
    #[derive(Default)]
    pub struct StubModel {
        replies: Mutex<VecDeque<Option<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubModel {
        pub fn replying<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| Some(r.into())).collect()),
                prompts: Mutex::default(),
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for StubModel {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, AdvisoryError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .ok_or_else(|| AdvisoryError::Provider("stub outage".to_string()))
        }
    }

    pub struct HangingModel;

    #[async_trait]
    impl ChatModel for HangingModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, AdvisoryError> {
            sleep(Duration::from_secs(30)).await;
            Ok("{}".to_string())
        }
    }

    pub fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "asha@example.com".into(),
            password_hash: String::new(),
            role: UserRole::Learner,
            first_name: Some("Asha".into()),
            last_name: Some("Rao".into()),
            profile_image_url: None,
            survey_completed: true,
            failed_login_count: 0,
            last_login: None,
            academic_background: Some("B.Com".into()),
            current_role: None,
            career_aspirations: None,
            socio_economic_context: None,
            preferred_language: "en".into(),
            learning_pace: LearningPace::Moderate,
            created_at: now,
            updated_at: now,
        }
    }
}
