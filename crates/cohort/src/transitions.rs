//! Transition graph construction.

use std::collections::BTreeMap;

use tracing::debug;

use stride_core::{Cohort, MilestoneId, Transition, TransitionGraph};

use crate::first_achievement_age;

/// Build the weighted transition graph over "next milestone mastered".
///
/// Per subject: compute the first-achievement age of every milestone, order
/// the mastered milestones by age, and record an edge from each milestone to
/// the one mastered at the smallest strictly greater age. Ties at that minimal
/// age break lexicographically by milestone id, so the graph is deterministic
/// for a given cohort. Edge counts are aggregated across subjects and
/// normalized per source milestone.
pub fn build_transition_graph(cohort: &Cohort) -> TransitionGraph {
    let mut counts: BTreeMap<MilestoneId, BTreeMap<MilestoneId, u64>> = BTreeMap::new();

    for (_, observations) in cohort.subjects() {
        let mut mastered: Vec<(MilestoneId, f64)> = cohort
            .milestones()
            .iter()
            .filter_map(|milestone| {
                first_achievement_age(observations, milestone)
                    .map(|age| (milestone.clone(), age))
            })
            .collect();
        mastered.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        for (source, source_age) in &mastered {
            // Successor: smallest age strictly greater than the source's;
            // equal ages are not eligible.
            let next = mastered
                .iter()
                .filter(|(_, age)| age > source_age)
                .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

            if let Some((target, _)) = next {
                *counts
                    .entry(source.clone())
                    .or_default()
                    .entry(target.clone())
                    .or_insert(0) += 1;
            }
        }
    }

    // Normalize to probabilities. Every cohort milestone gets a key, sources
    // without outgoing edges map to an empty distribution.
    let mut graph = TransitionGraph::new();
    for milestone in cohort.milestones() {
        let transitions = match counts.get(milestone) {
            Some(targets) if !targets.is_empty() => {
                let total: u64 = targets.values().sum();
                let mut transitions: Vec<Transition> = targets
                    .iter()
                    .map(|(target, count)| Transition {
                        milestone: target.clone(),
                        probability: *count as f64 / total as f64,
                    })
                    .collect();
                transitions.sort_by(|a, b| {
                    b.probability
                        .total_cmp(&a.probability)
                        .then_with(|| a.milestone.cmp(&b.milestone))
                });
                debug!(
                    milestone = %milestone,
                    transitions = total,
                    top_next = %transitions[0].milestone,
                    "transition distribution"
                );
                transitions
            }
            _ => Vec::new(),
        };
        graph.insert(milestone.clone(), transitions);
    }
    graph
}
