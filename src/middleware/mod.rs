pub mod gates;

pub use gates::{learners_only, policymakers_only, survey_required};
