//! Router harness for handler tests: in-memory storage, scripted model.

use crate::config::AppConfig;
use crate::db::memory::MemoryRepository;
use crate::db::Repository;
use crate::domain::models::{User, UserRole};
use crate::services::ai::testing::StubModel;
use crate::services::ai::{AdvisoryService, ChatModel};
use crate::services::password;
use crate::state::{AppState, SharedState};
use crate::web::session;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        session_secret: b"handler-test-session-secret".to_vec(),
        openai_api_key: "sk-test".into(),
        openai_model: "gpt-4o".into(),
        ai_timeout: Duration::from_secs(5),
        max_connections: 1,
        bind_addr: "127.0.0.1:0".into(),
        secure_cookies: false,
        cors_origin: None,
        admin: None,
    }
}

pub struct TestApp {
    pub repo: Arc<MemoryRepository>,
    pub model: Arc<StubModel>,
    pub state: SharedState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_model(StubModel::failing())
    }

    pub fn with_model(model: StubModel) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let model = Arc::new(model);
        let advisor = AdvisoryService::new(
            model.clone() as Arc<dyn ChatModel>,
            repo.clone() as Arc<dyn Repository>,
            Duration::from_secs(5),
        );
        let state: SharedState = Arc::new(AppState {
            repo: repo.clone(),
            advisor: Arc::new(advisor),
            config: Arc::new(test_config()),
        });
        let router = super::app(state.clone());
        Self {
            repo,
            model,
            state,
            router,
        }
    }

    /// Creates an account directly in storage and returns it with a valid
    /// session token.
    pub async fn seed_user(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        survey_completed: bool,
    ) -> (User, String) {
        let user = self
            .repo
            .create_user(crate::domain::models::NewUser {
                email: email.to_string(),
                password_hash: password::hash_password(password).unwrap(),
                role,
                first_name: "Test".into(),
                last_name: "User".into(),
            })
            .await
            .unwrap();
        if survey_completed {
            self.repo.mark_survey_completed(user.id).await.unwrap();
        }
        let user = self.repo.find_user_by_id(user.id).await.unwrap().unwrap();
        let token = session::sign_session(user.id, &self.state.config.session_secret).unwrap();
        (user, token)
    }

    /// A learner who has finished onboarding.
    pub async fn learner(&self) -> (User, String) {
        let email = format!("{}@learner.test", Uuid::new_v4().simple());
        self.seed_user(&email, TEST_PASSWORD, UserRole::Learner, true).await
    }

    pub async fn user_by_email(&self, email: &str) -> User {
        self.repo.find_user_by_email(email).await.unwrap().unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.send(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.send(Method::POST, uri, Some(body.to_string()), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.send(Method::PUT, uri, Some(body.to_string()), token).await
    }

    pub async fn post_raw(&self, uri: &str, body: &str, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.send(Method::POST, uri, Some(body.to_string()), token).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        token: Option<&str>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{}={}", session::COOKIE_NAME, token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, json)
    }
}
