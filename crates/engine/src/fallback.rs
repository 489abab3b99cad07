//! Age-window search: the cold-start path and the graduated fallback ladder.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use stride_core::{Category, MilestoneId, Recommendation};
use stride_store::ReferenceStore;

use crate::candidate::{sort_by_combined, sort_foundational, Candidate};
use crate::diversity::DiversitySelector;
use crate::scoring::{
    foundation_score, ADVANCED_FOUNDATIONAL_BOUND, ADVANCED_FUTURE_BOOST,
    ADVANCED_LIKELY_OVERFLOW, PROFICIENCY_FLOOR_MARGIN, MAX_RECOMMENDATIONS,
    UNIVERSE_FALLBACK_COMPLETION_RATE,
};

/// One rung of the fallback ladder: how far past/future to look, and how wide
/// the "likely" tolerance band is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeWindow {
    /// Maximum months past or future to consider
    pub bound: f64,
    /// Age-difference tolerance for the likely category
    pub tolerance: f64,
}

impl Default for AgeWindow {
    fn default() -> Self {
        // Standard window used for first-time cold starts.
        Self {
            bound: 3.0,
            tolerance: 0.5,
        }
    }
}

/// Progressively relaxed windows tried in order until the recommendation set
/// is full.
pub const FALLBACK_LADDER: [AgeWindow; 5] = [
    AgeWindow { bound: 3.0, tolerance: 0.5 },
    AgeWindow { bound: 6.0, tolerance: 1.0 },
    AgeWindow { bound: 12.0, tolerance: 2.0 },
    AgeWindow { bound: 24.0, tolerance: 6.0 },
    AgeWindow { bound: 48.0, tolerance: 12.0 },
];

/// Frequency-scored search over milestones with a known mastery age.
///
/// Serves both the cold-start path (no completed milestones, default window)
/// and the fallback ladder (widened windows, excluding prior picks). Returns
/// at most [`MAX_RECOMMENDATIONS`] candidates, diversity-selected the same
/// way as the warm path.
pub(crate) fn age_window_search(
    store: &ReferenceStore,
    age_months: f64,
    available: Option<&BTreeSet<MilestoneId>>,
    window: &AgeWindow,
    exclude: &BTreeSet<MilestoneId>,
    restrict_past: bool,
) -> Vec<Candidate> {
    let mut foundational = Vec::new();
    let mut likely = Vec::new();
    let mut challenge = Vec::new();

    for (id, mastery_age) in store.mastery_ages() {
        let Some(mastery_age) = mastery_age else {
            continue;
        };
        if exclude.contains(id) {
            continue;
        }
        if let Some(available) = available {
            if !available.contains(id) {
                continue;
            }
        }
        if restrict_past && mastery_age < age_months - PROFICIENCY_FLOOR_MARGIN {
            continue;
        }

        let probability = store.frequency_score(id);
        let age_difference = age_months - mastery_age;
        let make = |category: Category| Candidate {
            id: id.clone(),
            probability,
            discovery_score: 1.0 - probability,
            foundation_score: foundation_score(age_difference),
            mastery_age: Some(mastery_age),
            age_difference,
            domain: id.domain(),
            category,
        };

        if age_difference > window.tolerance && age_difference <= window.bound {
            if restrict_past {
                if age_difference <= ADVANCED_FOUNDATIONAL_BOUND {
                    foundational.push(make(Category::Foundational));
                } else if age_difference.abs() <= ADVANCED_LIKELY_OVERFLOW {
                    likely.push(make(Category::Likely));
                }
                // Further past: not offered to an advanced child.
            } else {
                foundational.push(make(Category::Foundational));
            }
        } else if age_difference < -window.tolerance && age_difference >= -window.bound {
            challenge.push(make(Category::Challenge));
        } else if age_difference.abs() <= window.tolerance {
            likely.push(make(Category::Likely));
        }
    }

    sort_foundational(&mut foundational);
    // Cold-start likely ranking: popularity first, then closest to the
    // child's age.
    likely.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then_with(|| a.age_difference.abs().total_cmp(&b.age_difference.abs()))
            .then_with(|| a.id.cmp(&b.id))
    });
    // Cold-start challenge ranking: nearest future milestone first.
    challenge.sort_by(|a, b| {
        let a_mastery = a.mastery_age.unwrap_or(f64::MAX);
        let b_mastery = b.mastery_age.unwrap_or(f64::MAX);
        a_mastery
            .total_cmp(&b_mastery)
            .then_with(|| b.probability.total_cmp(&a.probability))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut selector = DiversitySelector::new(MAX_RECOMMENDATIONS);
    let order: [&[Candidate]; 3] = if restrict_past {
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
            .map(|candidate| (cold_combined_score(&candidate, restrict_past), candidate))
            .collect();
        sort_by_combined(&mut pool, restrict_past);
        let pool: Vec<Candidate> = pool.into_iter().map(|(_, candidate)| candidate).collect();

        for candidate in &pool {
            if selector.is_full() {
                break;
            }
            if restrict_past {
                if let Some(mastery_age) = candidate.mastery_age {
                    if mastery_age < age_months - PROFICIENCY_FLOOR_MARGIN {
                        continue;
                    }
                }
                if candidate.category == Category::Foundational
                    && candidate.age_difference > ADVANCED_FOUNDATIONAL_BOUND
                {
                    continue;
                }
            }
            selector.backfill_pick(candidate, &pool);
        }
    }

    selector.into_picked()
}

/// Combined backfill score for frequency-scored candidates.
fn cold_combined_score(candidate: &Candidate, restrict_past: bool) -> f64 {
    let diff = candidate.age_difference;
    if restrict_past && diff > ADVANCED_FOUNDATIONAL_BOUND {
        let age_penalty = (diff - ADVANCED_FOUNDATIONAL_BOUND) * 0.5;
        candidate.foundation_score * 0.5 + candidate.probability * 0.3 - age_penalty
    } else if restrict_past && diff <= 0.0 {
        candidate.probability * 0.5 + candidate.discovery_score * 0.5 + ADVANCED_FUTURE_BOOST
    } else if diff > 0.0 {
        candidate.foundation_score * 0.7 + candidate.probability * 0.3
    } else {
        candidate.probability * 0.5 + candidate.discovery_score * 0.5
    }
}

/// Fill a short warm-start result from progressively relaxed age windows.
///
/// Each rung excludes completed milestones and everything already picked;
/// the first rung that fills the set ends the ladder. When at least 70% of
/// the available milestones are completed, a last-resort pass repeats the
/// widest search over the entire milestone universe, ignoring availability
/// (candidates must still carry a display name).
pub(crate) fn run_fallback_ladder(
    store: &ReferenceStore,
    age_months: f64,
    available: Option<&BTreeSet<MilestoneId>>,
    completed: &BTreeSet<MilestoneId>,
    advanced: bool,
    recommendations: &mut Vec<Recommendation>,
) {
    debug!(
        found = recommendations.len(),
        "transition frontier short, walking the fallback ladder"
    );

    for window in &FALLBACK_LADDER {
        if recommendations.len() >= MAX_RECOMMENDATIONS {
            break;
        }
        let mut exclude = completed.clone();
        exclude.extend(recommendations.iter().map(|r| r.milestone_id.clone()));

        let picks = age_window_search(store, age_months, available, window, &exclude, advanced);
        if !picks.is_empty() {
            debug!(
                bound = window.bound,
                tolerance = window.tolerance,
                found = picks.len(),
                "age-window fallback produced candidates"
            );
        }
        for candidate in picks {
            if recommendations.len() >= MAX_RECOMMENDATIONS {
                break;
            }
            recommendations.push(candidate.into_recommendation(store));
        }
    }

    if recommendations.len() >= MAX_RECOMMENDATIONS {
        return;
    }
    let Some(available_set) = available.filter(|set| !set.is_empty()) else {
        return;
    };
    let completed_available = completed
        .iter()
        .filter(|id| available_set.contains(*id))
        .count();
    let completion_rate = completed_available as f64 / available_set.len() as f64;
    if completion_rate < UNIVERSE_FALLBACK_COMPLETION_RATE {
        return;
    }

    warn!(
        completion_rate,
        "most available milestones completed, expanding search to the full universe"
    );
    let mut exclude = completed.clone();
    exclude.extend(recommendations.iter().map(|r| r.milestone_id.clone()));
    let widest = FALLBACK_LADDER[FALLBACK_LADDER.len() - 1];
    let picks = age_window_search(store, age_months, None, &widest, &exclude, advanced);
    for candidate in picks {
        if recommendations.len() >= MAX_RECOMMENDATIONS {
            break;
        }
        // Without activity content the name is all a caller can show.
        if !store.has_display_name(&candidate.id) {
            continue;
        }
        recommendations.push(candidate.into_recommendation(store));
    }
}
