//! Child profile passed into the recommendation engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::MilestoneId;

/// A child's current state: age plus the milestones already achieved.
///
/// The completed set is unordered and duplicate-free; callers may pass ids in
/// any order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildProfile {
    /// Age in months (non-negative; validated by the engine)
    pub age_months: f64,
    /// Milestones the child has already achieved
    pub completed: BTreeSet<MilestoneId>,
}

impl ChildProfile {
    /// Build a profile from an age and any iterable of milestone ids.
    pub fn new<I, M>(age_months: f64, completed: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MilestoneId>,
    {
        Self {
            age_months,
            completed: completed.into_iter().map(Into::into).collect(),
        }
    }
}
