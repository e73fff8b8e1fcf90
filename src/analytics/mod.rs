pub mod dashboard;

pub use dashboard::{progress_summary, summarize, DashboardAnalytics};
