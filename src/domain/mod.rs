pub mod achievements;
pub mod models;
pub mod progress;
