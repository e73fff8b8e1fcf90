pub mod admin;
pub mod ai;
pub mod auth;
pub mod catalog;
pub mod chatbot;
pub mod dashboard;
pub mod extract;
pub mod learning;
pub mod profile;
pub mod reference;
pub mod session;
pub mod skills;
pub mod survey;

#[cfg(test)]
pub mod testing;

use crate::domain::models::User;
use crate::error::{AppError, AppResult};
use crate::services::progress;
use crate::state::SharedState;
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router(state.clone()))
        .merge(profile::router(state.clone()))
        .merge(skills::router(state.clone()))
        .merge(catalog::router(state.clone()))
        .merge(learning::router(state.clone()))
        .nest("/ai", ai::router(state.clone()))
        .nest("/dashboard", dashboard::router(state.clone()))
        .nest("/survey", survey::router(state.clone()))
        .nest("/chatbot", chatbot::router(state.clone()))
        .nest("/reference", reference::router(state.clone()))
        .nest("/admin", admin::router(state));

    Router::new().nest("/api", api)
}

/// The API with its HTTP layers: request tracing, `nosniff`, and CORS for the
/// configured browser origin.
pub fn app(state: SharedState) -> Router {
    let cors = state.config.cors_origin.as_deref().and_then(|origin| {
        match HeaderValue::from_str(origin) {
            Ok(origin) => Some(
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods([Method::GET, Method::POST, Method::PUT])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                    .allow_credentials(true),
            ),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS_ORIGIN {}: {}", origin, e);
                None
            }
        }
    });

    let router = routes(state).layer(SetResponseHeaderLayer::if_not_present(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    ));
    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.layer(TraceLayer::new_for_http())
}

/// Full stored record of the caller. A principal whose row has vanished
/// between extraction and this lookup is treated as missing.
pub(crate) async fn load_user(state: &SharedState, user_id: Uuid) -> AppResult<User> {
    state
        .repo
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("user"))
}

/// Evaluates badges after learning activity. Failures are logged and never
/// fail the request that triggered them.
pub(crate) async fn refresh_achievements(state: &SharedState, user_id: Uuid) {
    if let Err(e) = progress::evaluate_achievements(state.repo.as_ref(), user_id).await {
        tracing::warn!(%user_id, "Achievement evaluation failed: {}", e);
    }
}
