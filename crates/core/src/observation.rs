//! Longitudinal cohort observations.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::MilestoneId;

/// Outcome of testing one milestone at one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Milestone was not tested at this visit (`-1` in the dataset)
    Untested,
    /// Tested and not achieved (`0`)
    NotAchieved,
    /// Tested and achieved (`1`)
    Achieved,
}

impl Outcome {
    /// Decode the dataset's integer coding (-1 / 0 / 1).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Outcome::Untested),
            0 => Some(Outcome::NotAchieved),
            1 => Some(Outcome::Achieved),
            _ => None,
        }
    }
}

/// One visit for one subject: age plus the milestone outcomes recorded then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Subject age at the visit, in months
    pub age_months: f64,
    /// Outcome per milestone tested at this visit
    pub outcomes: HashMap<MilestoneId, Outcome>,
}

impl Observation {
    /// Create an observation with no outcomes recorded yet.
    pub fn new(age_months: f64) -> Self {
        Self {
            age_months,
            outcomes: HashMap::new(),
        }
    }

    /// Record an outcome for a milestone.
    pub fn record(mut self, milestone: impl Into<MilestoneId>, outcome: Outcome) -> Self {
        self.outcomes.insert(milestone.into(), outcome);
        self
    }

    /// Outcome for a milestone, `Untested` when not recorded at this visit.
    pub fn outcome(&self, milestone: &MilestoneId) -> Outcome {
        self.outcomes
            .get(milestone)
            .copied()
            .unwrap_or(Outcome::Untested)
    }
}

/// The Observation Store: a longitudinal cohort dataset.
///
/// One entry per subject holding that subject's visits. Subjects iterate in a
/// deterministic order; visits are not required to be pre-sorted by age, the
/// analysis routines sort what they scan.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    milestones: Vec<MilestoneId>,
    subjects: BTreeMap<String, Vec<Observation>>,
}

impl Cohort {
    /// Create an empty cohort tracking the given milestone set.
    pub fn new(milestones: Vec<MilestoneId>) -> Self {
        Self {
            milestones,
            subjects: BTreeMap::new(),
        }
    }

    /// Milestones tracked by this cohort.
    pub fn milestones(&self) -> &[MilestoneId] {
        &self.milestones
    }

    /// Append an observation for a subject.
    pub fn push(&mut self, subject_id: impl Into<String>, observation: Observation) {
        self.subjects
            .entry(subject_id.into())
            .or_default()
            .push(observation);
    }

    /// Number of distinct subjects.
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Total number of observation rows.
    pub fn row_count(&self) -> usize {
        self.subjects.values().map(Vec::len).sum()
    }

    /// Iterate subjects with their observations, in subject-id order.
    pub fn subjects(&self) -> impl Iterator<Item = (&str, &[Observation])> {
        self.subjects
            .iter()
            .map(|(id, obs)| (id.as_str(), obs.as_slice()))
    }
}
