//! Observation frequency counts.

use std::collections::BTreeMap;

use stride_core::{Cohort, MilestoneId, Outcome};

/// Count of non-untested observations per milestone.
///
/// The cold-start path of the recommendation engine uses these counts,
/// normalized by the maximum, as a popularity proxy for "probability" when no
/// completed milestone exists to transition from.
pub fn observation_frequencies(cohort: &Cohort) -> BTreeMap<MilestoneId, u64> {
    let mut frequencies: BTreeMap<MilestoneId, u64> = cohort
        .milestones()
        .iter()
        .map(|m| (m.clone(), 0))
        .collect();

    for (_, observations) in cohort.subjects() {
        for observation in observations {
            for (milestone, outcome) in &observation.outcomes {
                if *outcome != Outcome::Untested {
                    if let Some(count) = frequencies.get_mut(milestone) {
                        *count += 1;
                    }
                }
            }
        }
    }
    frequencies
}
