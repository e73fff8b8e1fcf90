use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process configuration, read once at startup.
///
/// | Env Var                    | Required | Default        |
/// |----------------------------|----------|----------------|
/// | `DATABASE_URL`             | **yes**  | --             |
/// | `SESSION_SECRET`           | **yes**  | `JWT_SECRET`   |
/// | `OPENAI_API_KEY`           | **yes**  | --             |
/// | `OPENAI_MODEL`             | no       | `gpt-4o`       |
/// | `AI_TIMEOUT_SECS`          | no       | `30`           |
/// | `DATABASE_MAX_CONNECTIONS` | no       | `10`           |
/// | `BIND_ADDR` / `PORT`       | no       | `0.0.0.0:3000` |
/// | `CORS_ORIGIN`              | no       | same-origin    |
/// | `ADMIN_EMAIL` + `ADMIN_PASSWORD` | no | --             |
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub session_secret: Vec<u8>,
    pub openai_api_key: String,
    pub openai_model: String,
    pub ai_timeout: Duration,
    pub max_connections: u32,
    pub bind_addr: String,
    pub secure_cookies: bool,
    /// Browser origin allowed to call the API with credentials.
    pub cors_origin: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap").field("email", &self.email).finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let session_secret = get("SESSION_SECRET")
            .or_else(|| get("JWT_SECRET"))
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?
            .into_bytes();
        let openai_api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let openai_model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let ai_timeout_secs = parse_or("AI_TIMEOUT_SECS", get("AI_TIMEOUT_SECS"), DEFAULT_AI_TIMEOUT_SECS)?;
        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            get("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let port = get("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let secure_cookies = ["PRODUCTION", "RAILWAY_ENVIRONMENT", "RENDER", "FLY_APP_NAME"]
            .into_iter()
            .any(|name| get(name).is_some());

        let cors_origin = get("CORS_ORIGIN").map(|o| o.trim().trim_end_matches('/').to_string());

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            _ => None,
        };

        Ok(Self {
            database_url,
            session_secret,
            openai_api_key,
            openai_model,
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            max_connections,
            bind_addr,
            secure_cookies,
            cors_origin,
            admin,
        })
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
