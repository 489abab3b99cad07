//! The recommendation entry point: warm-start scoring over the transition
//! frontier, with cold-start and fallback delegation.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use stride_core::{Category, ChildProfile, MilestoneId, Recommendation};
use stride_store::ReferenceStore;

use crate::candidate::{
    sort_by_combined, sort_challenge, sort_foundational, sort_likely, Candidate,
};
use crate::diversity::DiversitySelector;
use crate::fallback::{age_window_search, run_fallback_ladder, AgeWindow};
use crate::scoring::{
    categorize_by_age, foundation_score, ADVANCED_FOUNDATIONAL_BOUND, ADVANCED_FUTURE_BOOST,
    ADVANCED_LIKELY_OVERFLOW, DISCOVERY_WEIGHT_BASE, DISCOVERY_WEIGHT_LEVEL_UP,
    LEVEL_UP_THRESHOLD, MAX_RECOMMENDATIONS, NO_MASTERY_LIKELY_THRESHOLD, PROFICIENCY_AGE_MARGIN,
    PROFICIENCY_FLOOR_MARGIN, PROFICIENCY_THRESHOLD,
};
use crate::EngineError;

/// Produce up to [`MAX_RECOMMENDATIONS`] next milestones for a child.
///
/// With no completed milestones the result is a cold start driven by
/// observation frequency over the default age window. Otherwise candidates
/// come from the outgoing transitions of the completed set, scored and
/// diversified across domains, with the age-window fallback ladder topping
/// up short warm-start results. Completed
/// milestones are never recommended, and when `available` is given only
/// milestones in it are eligible (until the last-resort universe expansion).
pub fn recommend(
    store: &ReferenceStore,
    profile: &ChildProfile,
    available: Option<&BTreeSet<MilestoneId>>,
) -> Result<Vec<Recommendation>, EngineError> {
    if profile.age_months < 0.0 {
        return Err(EngineError::NegativeAge(profile.age_months));
    }
    let age = profile.age_months;
    let completed = &profile.completed;

    if completed.is_empty() {
        // Cold start searches the default window only; a sparse cohort
        // legitimately yields a short or empty list. The widening ladder is
        // reserved for short warm-start results.
        debug!(age, "no completed milestones, running cold start");
        let picks = age_window_search(
            store,
            age,
            available,
            &AgeWindow::default(),
            &BTreeSet::new(),
            false,
        );
        let recommendations: Vec<Recommendation> = picks
            .into_iter()
            .map(|candidate| candidate.into_recommendation(store))
            .collect();
        info!(age, count = recommendations.len(), "cold-start recommendations");
        return Ok(recommendations);
    }

    // Frontier: every uncompleted successor of a completed milestone, scored
    // by the strongest observed transition into it.
    let mut frontier: BTreeMap<MilestoneId, f64> = BTreeMap::new();
    for source in completed {
        for transition in store.transitions_from(source) {
            if completed.contains(&transition.milestone) {
                continue;
            }
            if let Some(available) = available {
                if !available.contains(&transition.milestone) {
                    continue;
                }
            }
            let entry = frontier.entry(transition.milestone.clone()).or_insert(0.0);
            if transition.probability > *entry {
                *entry = transition.probability;
            }
        }
    }

    let advanced = is_advanced(store, age, completed);
    let discovery_weight = if completed.len() >= LEVEL_UP_THRESHOLD {
        DISCOVERY_WEIGHT_LEVEL_UP
    } else {
        DISCOVERY_WEIGHT_BASE
    };
    debug!(
        age,
        completed = completed.len(),
        frontier = frontier.len(),
        advanced,
        discovery_weight,
        "scoring transition frontier"
    );

    let mut foundational = Vec::new();
    let mut likely = Vec::new();
    let mut challenge = Vec::new();

    for (id, probability) in frontier {
        let mastery_age = store.mastery_age(&id);
        let category = match mastery_age {
            Some(mastery_age) => {
                if advanced && mastery_age < age - PROFICIENCY_FLOOR_MARGIN {
                    continue;
                }
                let age_difference = age - mastery_age;
                let Some(mut category) = categorize_by_age(age_difference) else {
                    continue;
                };
                if advanced
                    && category == Category::Foundational
                    && age_difference > ADVANCED_FOUNDATIONAL_BOUND
                {
                    if age_difference.abs() > ADVANCED_LIKELY_OVERFLOW {
                        continue;
                    }
                    category = Category::Likely;
                }
                category
            }
            // No cohort mastery age: bucket by transition strength alone.
            None => {
                if probability >= NO_MASTERY_LIKELY_THRESHOLD {
                    Category::Likely
                } else {
                    Category::Challenge
                }
            }
        };

        let age_difference = mastery_age.map(|m| age - m).unwrap_or(0.0);
        let candidate = Candidate {
            domain: id.domain(),
            id,
            probability,
            discovery_score: 1.0 - probability,
            foundation_score: foundation_score(age_difference),
            mastery_age,
            age_difference,
            category,
        };
        match category {
            Category::Foundational => foundational.push(candidate),
            Category::Likely => likely.push(candidate),
            Category::Challenge => challenge.push(candidate),
        }
    }

    sort_foundational(&mut foundational);
    sort_likely(&mut likely, discovery_weight);
    sort_challenge(&mut challenge, discovery_weight);

    let mut selector = DiversitySelector::new(MAX_RECOMMENDATIONS);
    let order: [&[Candidate]; 3] = if advanced {
        // An advanced child has no catch-up debt; lead with the age-typical
        // and stretch pools.
        [&likely, &challenge, &foundational]
    } else {
        [&foundational, &likely, &challenge]
    };
    for pool in order {
        if selector.is_full() {
            break;
        }
        selector.try_pick(pool);
    }

    if !selector.is_full() {
        let mut pool: Vec<(f64, Candidate)> = foundational
            .into_iter()
            .chain(likely)
            .chain(challenge)
            .filter(|candidate| !selector.contains(&candidate.id))
            .map(|candidate| {
                let score = combined_score(&candidate, advanced, discovery_weight);
                (score, candidate)
            })
            .collect();
        sort_by_combined(&mut pool, advanced);
        let pool: Vec<Candidate> = pool.into_iter().map(|(_, candidate)| candidate).collect();
        for candidate in &pool {
            if selector.is_full() {
                break;
            }
            selector.backfill_pick(candidate, &pool);
        }
    }

    let mut recommendations: Vec<Recommendation> = selector
        .into_picked()
        .into_iter()
        .map(|candidate| candidate.into_recommendation(store))
        .collect();

    if recommendations.len() < MAX_RECOMMENDATIONS {
        run_fallback_ladder(store, age, available, completed, advanced, &mut recommendations);
    }

    info!(
        age,
        completed = completed.len(),
        count = recommendations.len(),
        "recommendations ready"
    );
    Ok(recommendations)
}

/// A child is advanced when enough completed milestones sit at or near their
/// current age.
fn is_advanced(store: &ReferenceStore, age: f64, completed: &BTreeSet<MilestoneId>) -> bool {
    let age_appropriate = completed
        .iter()
        .filter_map(|id| store.mastery_age(id))
        .filter(|mastery_age| *mastery_age >= age - PROFICIENCY_AGE_MARGIN)
        .count();
    age_appropriate >= PROFICIENCY_THRESHOLD
}

/// Combined score used when backfilling across categories.
///
/// Overdue milestones trade probability for catch-up urgency; an advanced
/// child flips that, penalizing staleness and boosting future stretch.
fn combined_score(candidate: &Candidate, advanced: bool, discovery_weight: f64) -> f64 {
    if candidate.mastery_age.is_none() {
        return candidate.probability * 0.7 + candidate.discovery_score * 0.3;
    }
    let diff = candidate.age_difference;
    if advanced && diff > ADVANCED_FOUNDATIONAL_BOUND {
        let staleness_penalty = (diff - ADVANCED_FOUNDATIONAL_BOUND) * 0.5;
        candidate.foundation_score * 0.5 + candidate.probability * 0.3 - staleness_penalty
    } else if advanced && diff <= 0.0 {
        candidate.weighted(discovery_weight) + ADVANCED_FUTURE_BOOST
    } else if diff > 0.0 {
        candidate.foundation_score * 0.7 + candidate.probability * 0.3
    } else {
        candidate.weighted(discovery_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use stride_core::{Transition, TransitionGraph};

    fn id(s: &str) -> MilestoneId {
        MilestoneId::from(s)
    }

    struct StoreBuilder {
        mastery_ages: BTreeMap<MilestoneId, Option<f64>>,
        transitions: TransitionGraph,
        names: HashMap<MilestoneId, String>,
        frequencies: BTreeMap<MilestoneId, u64>,
    }

    impl StoreBuilder {
        fn new() -> Self {
            Self {
                mastery_ages: BTreeMap::new(),
                transitions: TransitionGraph::new(),
                names: HashMap::new(),
                frequencies: BTreeMap::new(),
            }
        }

        fn milestone(mut self, milestone: &str, mastery_age: Option<f64>, frequency: u64) -> Self {
            self.mastery_ages.insert(id(milestone), mastery_age);
            self.frequencies.insert(id(milestone), frequency);
            self.names
                .insert(id(milestone), format!("Milestone {milestone}"));
            self
        }

        fn unnamed(mut self, milestone: &str, mastery_age: Option<f64>, frequency: u64) -> Self {
            self.mastery_ages.insert(id(milestone), mastery_age);
            self.frequencies.insert(id(milestone), frequency);
            self
        }

        fn edge(mut self, from: &str, to: &str, probability: f64) -> Self {
            self.transitions.entry(id(from)).or_default().push(Transition {
                milestone: id(to),
                probability,
            });
            self
        }

        fn build(self) -> ReferenceStore {
            ReferenceStore::from_parts(
                self.mastery_ages,
                self.transitions,
                self.names,
                None,
                self.frequencies,
            )
        }
    }

    fn ids(recommendations: &[Recommendation]) -> Vec<&str> {
        recommendations
            .iter()
            .map(|r| r.milestone_id.as_str())
            .collect()
    }

    #[test]
    fn test_negative_age_is_an_error() {
        let store = StoreBuilder::new().build();
        let profile = ChildProfile::new(-1.0, Vec::<&str>::new());
        let err = recommend(&store, &profile, None).unwrap_err();
        assert!(matches!(err, EngineError::NegativeAge(age) if age == -1.0));
    }

    #[test]
    fn test_warm_path_follows_transition_probabilities() {
        // A completed; B at 0.8 and C at 0.2, both age-typical.
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(4.0), 40)
            .milestone("ddifmd003", Some(4.2), 30)
            .edge("ddicmm001", "ddigmd002", 0.8)
            .edge("ddicmm001", "ddifmd003", 0.2)
            .build();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert_eq!(ids(&recommendations), vec!["ddigmd002", "ddifmd003"]);
        let first = &recommendations[0];
        assert_eq!(first.category, Category::Likely);
        assert_eq!(first.probability, 0.8);
        assert_eq!(first.mastery_age, Some(4.0));
        assert_eq!(first.milestone_name, "Milestone ddigmd002");
    }

    #[test]
    fn test_never_recommends_completed_and_caps_at_three() {
        let mut builder = StoreBuilder::new().milestone("ddicmm001", Some(3.0), 50);
        for i in 2..=8 {
            let milestone = format!("ddigmd00{i}");
            builder = builder
                .milestone(&milestone, Some(4.0), 40)
                .edge("ddicmm001", &milestone, 0.1 * i as f64);
        }
        let store = builder.build();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert_eq!(recommendations.len(), MAX_RECOMMENDATIONS);
        let unique: BTreeSet<_> = recommendations.iter().map(|r| &r.milestone_id).collect();
        assert_eq!(unique.len(), MAX_RECOMMENDATIONS);
        assert!(!recommendations
            .iter()
            .any(|r| r.milestone_id == id("ddicmm001")));
    }

    #[test]
    fn test_cold_start_stays_within_default_window() {
        // The only milestone sits 16 months in the future, far outside the
        // default window; a cold start must come back empty rather than
        // widen the search.
        let store = StoreBuilder::new()
            .milestone("ddigmd002", Some(20.0), 30)
            .build();
        let profile = ChildProfile::new(4.0, Vec::<&str>::new());
        let recommendations = recommend(&store, &profile, None).unwrap();
        assert!(recommendations.is_empty());
    }

    #[test]
    fn test_cold_start_ranks_by_frequency() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(4.0), 10)
            .milestone("ddicmm002", Some(4.0), 50)
            .build();
        let profile = ChildProfile::new(4.0, Vec::<&str>::new());
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert_eq!(recommendations[0].milestone_id, id("ddicmm002"));
        assert_eq!(recommendations[0].probability, 1.0);
        assert_eq!(recommendations[0].category, Category::Likely);
    }

    #[test]
    fn test_cold_start_spans_categories_and_domains() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(4.0), 50) // likely, cognitive
            .milestone("ddigmd002", Some(2.0), 40) // foundational, gross motor
            .milestone("ddifmd003", Some(6.0), 30) // challenge, fine motor
            .build();
        let profile = ChildProfile::new(4.0, Vec::<&str>::new());
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert_eq!(recommendations.len(), 3);
        let domains: BTreeSet<_> = recommendations
            .iter()
            .map(|r| r.milestone_id.domain())
            .collect();
        assert_eq!(domains.len(), 3);
        let categories: Vec<_> = recommendations.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![Category::Foundational, Category::Likely, Category::Challenge]
        );
    }

    #[test]
    fn test_results_are_deterministic() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(4.0), 40)
            .milestone("ddigmd003", Some(4.0), 40)
            .milestone("ddifmd004", Some(6.0), 20)
            .edge("ddicmm001", "ddigmd002", 0.4)
            .edge("ddicmm001", "ddigmd003", 0.4)
            .edge("ddicmm001", "ddifmd004", 0.2)
            .build();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);

        let first = recommend(&store, &profile, None).unwrap();
        let second = recommend(&store, &profile, None).unwrap();
        assert_eq!(ids(&first), ids(&second));
        // Equal probabilities break lexicographically.
        assert!(ids(&first).contains(&"ddigmd002"));
    }

    #[test]
    fn test_advanced_child_skips_stale_milestones() {
        // Child at 10 months mastered two age-typical milestones; a frontier
        // candidate typically mastered at 6 months is beneath the floor.
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(9.5), 50)
            .milestone("ddigmd002", Some(10.0), 50)
            .milestone("ddifmd003", Some(6.0), 40)
            .milestone("ddifmd004", Some(10.2), 40)
            .edge("ddicmm001", "ddifmd003", 0.9)
            .edge("ddigmd002", "ddifmd004", 0.6)
            .build();
        let profile = ChildProfile::new(10.0, vec!["ddicmm001", "ddigmd002"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert!(!recommendations
            .iter()
            .any(|r| r.milestone_id == id("ddifmd003")));
        assert!(recommendations
            .iter()
            .any(|r| r.milestone_id == id("ddifmd004")));
    }

    #[test]
    fn test_fallback_ladder_respects_advanced_floor() {
        // Advanced child (two age-typical completions) with no outgoing
        // transitions: the ladder must fill from the age windows without
        // surfacing anything below the mastery-age floor.
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(9.5), 50)
            .milestone("ddigmd002", Some(10.0), 50)
            .milestone("ddifmd003", Some(6.0), 60)
            .milestone("ddifmd004", Some(9.2), 40)
            .build();
        let profile = ChildProfile::new(10.0, vec!["ddicmm001", "ddigmd002"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert_eq!(ids(&recommendations), vec!["ddifmd004"]);
        assert_eq!(recommendations[0].category, Category::Foundational);
        assert!(recommendations
            .iter()
            .all(|r| r.mastery_age.unwrap() >= 10.0 - 2.0));
    }

    #[test]
    fn test_fallback_ladder_fills_when_frontier_is_empty() {
        // Completed milestone has no outgoing transitions; only a distant
        // future milestone exists, reachable at the 24-month rung.
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(20.0), 30)
            .build();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert_eq!(ids(&recommendations), vec!["ddigmd002"]);
        assert_eq!(recommendations[0].category, Category::Challenge);
    }

    #[test]
    fn test_availability_filter_is_honored() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(4.0), 40)
            .milestone("ddifmd003", Some(4.0), 40)
            .edge("ddicmm001", "ddigmd002", 0.8)
            .edge("ddicmm001", "ddifmd003", 0.7)
            .build();
        let available: BTreeSet<MilestoneId> = [id("ddifmd003")].into();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, Some(&available)).unwrap();

        assert_eq!(ids(&recommendations), vec!["ddifmd003"]);
    }

    #[test]
    fn test_universe_expansion_after_high_completion() {
        // Both available milestones completed; the only remaining candidates
        // live outside the availability set, and only the named one appears.
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(3.5), 40)
            .milestone("ddifmd003", Some(4.0), 30)
            .unnamed("ddifmd004", Some(4.2), 30)
            .build();
        let available: BTreeSet<MilestoneId> = [id("ddicmm001"), id("ddigmd002")].into();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001", "ddigmd002"]);
        let recommendations = recommend(&store, &profile, Some(&available)).unwrap();

        assert_eq!(ids(&recommendations), vec!["ddifmd003"]);
    }

    #[test]
    fn test_no_universe_expansion_below_completion_threshold() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(3.5), 40)
            .milestone("ddigmd003", Some(3.5), 40)
            .milestone("ddifmd004", Some(4.0), 30)
            .build();
        let available: BTreeSet<MilestoneId> =
            [id("ddicmm001"), id("ddigmd002"), id("ddigmd003")].into();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, Some(&available)).unwrap();

        // 1 of 3 available completed: stays within the availability set.
        assert!(!recommendations
            .iter()
            .any(|r| r.milestone_id == id("ddifmd004")));
    }

    #[test]
    fn test_unknown_mastery_age_buckets_by_probability() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(4.0), 50)
            .milestone("ddigmd002", None, 40)
            .milestone("ddifmd003", None, 40)
            .edge("ddicmm001", "ddigmd002", 0.7)
            .edge("ddicmm001", "ddifmd003", 0.3)
            .build();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        let by_id: BTreeMap<_, _> = recommendations
            .iter()
            .map(|r| (r.milestone_id.as_str(), r.category))
            .collect();
        assert_eq!(by_id["ddigmd002"], Category::Likely);
        assert_eq!(by_id["ddifmd003"], Category::Challenge);
    }

    #[test]
    fn test_empty_store_yields_empty_result() {
        let store = StoreBuilder::new().build();
        let profile = ChildProfile::new(4.0, Vec::<&str>::new());
        let recommendations = recommend(&store, &profile, None).unwrap();
        assert!(recommendations.is_empty());
    }

    #[test]
    fn test_diversity_prefers_second_domain_in_warm_path() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(4.0), 40)
            .milestone("ddigmd003", Some(4.0), 40)
            .milestone("ddifmd004", Some(4.0), 40)
            .edge("ddicmm001", "ddigmd002", 0.8)
            .edge("ddicmm001", "ddigmd003", 0.7)
            .edge("ddicmm001", "ddifmd004", 0.3)
            .build();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        // All three land in the likely pool; the fine-motor candidate jumps
        // the second-ranked gross-motor one.
        assert_eq!(ids(&recommendations)[..2], ["ddigmd002", "ddifmd004"]);
    }

    #[test]
    fn test_level_up_weight_flips_backfill_toward_challenge() {
        let challenge = Candidate {
            id: id("ddifmd001"),
            domain: id("ddifmd001").domain(),
            probability: 0.2,
            discovery_score: 0.8,
            foundation_score: 0.0,
            mastery_age: Some(6.0),
            age_difference: -2.0,
            category: Category::Challenge,
        };
        let foundational = Candidate {
            id: id("ddigmd002"),
            domain: id("ddigmd002").domain(),
            probability: 0.9,
            discovery_score: 0.1,
            foundation_score: 0.25,
            mastery_age: Some(1.0),
            age_difference: 3.0,
            category: Category::Foundational,
        };
        // Base weight: 0.36 for the challenge vs 0.445 for the foundational.
        assert!(
            combined_score(&foundational, false, DISCOVERY_WEIGHT_BASE)
                > combined_score(&challenge, false, DISCOVERY_WEIGHT_BASE)
        );
        // Leveled up: the rare challenge transition scores 0.52 and wins.
        assert!(
            combined_score(&challenge, false, DISCOVERY_WEIGHT_LEVEL_UP)
                > combined_score(&foundational, false, DISCOVERY_WEIGHT_LEVEL_UP)
        );
    }

    #[test]
    fn test_foundational_outranks_likely_for_typical_child() {
        let store = StoreBuilder::new()
            .milestone("ddicmm001", Some(3.0), 50)
            .milestone("ddigmd002", Some(2.0), 20) // 2 months overdue
            .milestone("ddifmd003", Some(4.0), 40) // age-typical
            .edge("ddicmm001", "ddigmd002", 0.3)
            .edge("ddicmm001", "ddifmd003", 0.9)
            .build();
        let profile = ChildProfile::new(4.0, vec!["ddicmm001"]);
        let recommendations = recommend(&store, &profile, None).unwrap();

        assert_eq!(recommendations[0].milestone_id, id("ddigmd002"));
        assert_eq!(recommendations[0].category, Category::Foundational);
        assert!(recommendations[0].foundation_score > 0.0);
    }
}
