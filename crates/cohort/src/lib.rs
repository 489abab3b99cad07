//! Cohort ingestion and milestone analytics.
//!
//! This crate reads the processed longitudinal cohort table and derives the
//! statistical model the recommendation engine runs on:
//! - Mastery ages: median age of first not-achieved -> achieved transition
//! - Transition graph: per-milestone distribution over the next mastered milestone
//! - Observation frequencies: cold-start popularity signal

mod frequency;
mod loader;
mod mastery;
mod transitions;

pub use frequency::observation_frequencies;
pub use loader::{load_cohort, CohortError};
pub use mastery::{all_mastery_ages, mastery_age};
pub use transitions::build_transition_graph;

use stride_core::{MilestoneId, Observation, Outcome};

/// Age of a subject's first not-achieved -> achieved transition for a milestone.
///
/// Untested visits never participate in the scan. The subject's visits for the
/// milestone are sorted by age; the first consecutive pair going from
/// `NotAchieved` to `Achieved` yields the later age. Subjects with fewer than
/// two tested visits, or no such transition, yield `None`.
pub(crate) fn first_achievement_age(
    observations: &[Observation],
    milestone: &MilestoneId,
) -> Option<f64> {
    let mut tested: Vec<(f64, Outcome)> = observations
        .iter()
        .map(|obs| (obs.age_months, obs.outcome(milestone)))
        .filter(|(_, outcome)| *outcome != Outcome::Untested)
        .collect();

    if tested.len() < 2 {
        return None;
    }

    tested.sort_by(|a, b| a.0.total_cmp(&b.0));

    tested
        .windows(2)
        .find(|pair| pair[0].1 == Outcome::NotAchieved && pair[1].1 == Outcome::Achieved)
        .map(|pair| pair[1].0)
}
