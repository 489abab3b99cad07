//! Milestone transition graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MilestoneId;

/// One outgoing edge of the transition graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// The milestone mastered next
    pub milestone: MilestoneId,
    /// Probability of this being the next milestone (per source, sums to 1)
    pub probability: f64,
}

/// Per-milestone distribution over "which milestone is mastered next".
///
/// Every milestone of the source cohort appears as a key; a milestone with no
/// observed outgoing transitions maps to an empty list. Lists are sorted by
/// probability descending, id ascending on ties.
pub type TransitionGraph = BTreeMap<MilestoneId, Vec<Transition>>;
