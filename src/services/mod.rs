pub mod ai;
pub mod password;
pub mod progress;
pub mod prompts;
