//! Stride core data models.
//!
//! This crate defines the data structures shared across the milestone
//! analytics pipeline and the recommendation engine.

#![warn(missing_docs)]

// Milestone identity and domains
mod milestone;

// Cohort observations
mod observation;

// Child profile and engine output
mod profile;
mod recommendation;

// Transition graph
mod transition;

// Re-exports
pub use milestone::{Domain, MilestoneId, MILESTONE_PREFIX};
pub use observation::{Cohort, Observation, Outcome};
pub use profile::ChildProfile;
pub use recommendation::{Category, Recommendation};
pub use transition::{Transition, TransitionGraph};

/// Round a value to the given number of decimal places.
///
/// Scores in persisted artifacts and engine output are rounded (4 decimals
/// for probabilities, 2 for foundation scores).
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
