//! Scored candidate milestones flowing through selection.

use stride_core::{round_dp, Category, Domain, MilestoneId, Recommendation};
use stride_store::ReferenceStore;

use crate::scoring::weighted_score;

/// A milestone under consideration, with its scores and category.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub id: MilestoneId,
    /// Transition probability (warm) or normalized frequency (cold).
    pub probability: f64,
    pub discovery_score: f64,
    pub foundation_score: f64,
    pub mastery_age: Option<f64>,
    /// Child age minus mastery age; 0 when the mastery age is unknown.
    pub age_difference: f64,
    pub domain: Domain,
    pub category: Category,
}

impl Candidate {
    pub fn weighted(&self, discovery_weight: f64) -> f64 {
        weighted_score(
            self.probability,
            self.discovery_score,
            self.category,
            discovery_weight,
        )
    }

    /// Format for output: display name lookup plus score rounding.
    pub fn into_recommendation(self, store: &ReferenceStore) -> Recommendation {
        Recommendation {
            milestone_name: store.display_name(&self.id),
            milestone_id: self.id,
            probability: round_dp(self.probability, 4),
            discovery_score: round_dp(self.discovery_score, 4),
            foundation_score: round_dp(self.foundation_score, 2),
            category: self.category,
            mastery_age: self.mastery_age,
        }
    }
}

/// Foundational order: most recently overdue first (mastery age descending),
/// then probability descending.
pub(crate) fn sort_foundational(list: &mut [Candidate]) {
    list.sort_by(|a, b| {
        let a_mastery = a.mastery_age.unwrap_or(0.0);
        let b_mastery = b.mastery_age.unwrap_or(0.0);
        b_mastery
            .total_cmp(&a_mastery)
            .then_with(|| b.probability.total_cmp(&a.probability))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Likely order: weighted score descending.
pub(crate) fn sort_likely(list: &mut [Candidate], discovery_weight: f64) {
    list.sort_by(|a, b| {
        b.weighted(discovery_weight)
            .total_cmp(&a.weighted(discovery_weight))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Challenge order: weighted score descending, nearest future milestone on
/// ties; candidates without a mastery age sort last.
pub(crate) fn sort_challenge(list: &mut [Candidate], discovery_weight: f64) {
    list.sort_by(|a, b| {
        let a_mastery = a.mastery_age.unwrap_or(f64::MAX);
        let b_mastery = b.mastery_age.unwrap_or(f64::MAX);
        b.weighted(discovery_weight)
            .total_cmp(&a.weighted(discovery_weight))
            .then_with(|| a_mastery.total_cmp(&b_mastery))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Order a backfill pool by combined score descending; advanced children
/// additionally prefer the youngest qualifying mastery age on ties.
pub(crate) fn sort_by_combined(pool: &mut Vec<(f64, Candidate)>, advanced: bool) {
    pool.sort_by(|(score_a, a), (score_b, b)| {
        let ordering = score_b.total_cmp(score_a);
        let ordering = if advanced {
            let a_mastery = a.mastery_age.unwrap_or(f64::MAX);
            let b_mastery = b.mastery_age.unwrap_or(f64::MAX);
            ordering.then_with(|| a_mastery.total_cmp(&b_mastery))
        } else {
            ordering
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    });
}
