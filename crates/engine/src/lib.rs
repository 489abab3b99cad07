//! Milestone recommendation engine.
//!
//! Given a child profile and the reference store, produces up to three
//! diversified recommendations spanning the foundational / likely / challenge
//! categories, with a graduated age-window fallback when the transition
//! frontier runs dry. All computation is pure and synchronous; the store is
//! borrowed immutably, so concurrent calls need no coordination.

mod candidate;
mod diversity;
mod fallback;
mod recommend;
mod scoring;

pub use fallback::{AgeWindow, FALLBACK_LADDER};
pub use recommend::recommend;
pub use scoring::{
    categorize_by_age, foundation_score, weighted_score, DISCOVERY_WEIGHT_BASE,
    DISCOVERY_WEIGHT_LEVEL_UP, FOUNDATIONAL_AGE_BOUND, LEVEL_UP_THRESHOLD, LIKELY_AGE_TOLERANCE,
    MAX_RECOMMENDATIONS,
};

/// Errors raised by the recommendation engine.
///
/// Absence of qualifying candidates is not an error: the engine returns a
/// short or empty list instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The profile's age is negative.
    #[error("age_months must be non-negative, got {0}")]
    NegativeAge(f64),
}
