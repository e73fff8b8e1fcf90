use crate::config::AppConfig;
use crate::db::Repository;
use crate::services::ai::AdvisoryService;
use std::sync::Arc;

pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub advisor: Arc<AdvisoryService>,
    pub config: Arc<AppConfig>,
}

pub type SharedState = Arc<AppState>;
