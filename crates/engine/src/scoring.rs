//! Scoring constants and helpers shared by the warm and cold paths.

use stride_core::Category;

/// Recommendation sets never exceed this size.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Foundational window: past the typical age but within this many months.
pub const FOUNDATIONAL_AGE_BOUND: f64 = 3.0;
/// Likely window: within this many months of the typical age.
pub const LIKELY_AGE_TOLERANCE: f64 = 0.5;
/// Challenge window: ahead of the typical age but within this many months.
pub const CHALLENGE_AGE_BOUND: f64 = 3.0;

/// Foundation score saturates at this many months overdue.
pub const MAX_FOUNDATION_AGE_DIFF: f64 = 12.0;

/// Base weight of the discovery score in likely/challenge ranking.
pub const DISCOVERY_WEIGHT_BASE: f64 = 0.2;
/// Discovery weight once the child has leveled up.
pub const DISCOVERY_WEIGHT_LEVEL_UP: f64 = 0.4;
/// Completed milestones needed to level up.
pub const LEVEL_UP_THRESHOLD: usize = 5;

/// Age-appropriate completed milestones needed to flag the child as advanced.
pub(crate) const PROFICIENCY_THRESHOLD: usize = 2;
/// A completed milestone counts as age-appropriate when its mastery age is at
/// least the child's age minus this margin.
pub(crate) const PROFICIENCY_AGE_MARGIN: f64 = 1.0;
/// Advanced children never see candidates with mastery age below the child's
/// age minus this margin.
pub(crate) const PROFICIENCY_FLOOR_MARGIN: f64 = 2.0;
/// Tightened foundational window for advanced children.
pub(crate) const ADVANCED_FOUNDATIONAL_BOUND: f64 = 1.0;
/// Overdue near-misses up to this far past are reclassified likely for
/// advanced children instead of being discarded.
pub(crate) const ADVANCED_LIKELY_OVERFLOW: f64 = 1.5;
/// Backfill boost for future milestones when the child is advanced.
pub(crate) const ADVANCED_FUTURE_BOOST: f64 = 0.2;

/// Candidates without a mastery age count as likely at or above this
/// probability, challenge below it.
pub(crate) const NO_MASTERY_LIKELY_THRESHOLD: f64 = 0.5;

/// Share of available milestones that must be completed before the fallback
/// widens to the entire milestone universe.
pub(crate) const UNIVERSE_FALLBACK_COMPLETION_RATE: f64 = 0.7;

/// Categorize a candidate by how the child's age compares to its mastery age.
///
/// `age_difference` is child age minus mastery age; positive means overdue.
/// The foundational check runs first, so a slightly-overdue milestone within
/// the likely tolerance still counts as foundational. Returns `None` outside
/// all three windows.
pub fn categorize_by_age(age_difference: f64) -> Option<Category> {
    if age_difference > 0.0 && age_difference <= FOUNDATIONAL_AGE_BOUND {
        Some(Category::Foundational)
    } else if age_difference < -LIKELY_AGE_TOLERANCE && age_difference >= -CHALLENGE_AGE_BOUND {
        Some(Category::Challenge)
    } else if age_difference.abs() <= LIKELY_AGE_TOLERANCE {
        Some(Category::Likely)
    } else {
        None
    }
}

/// Catch-up urgency in [0, 1]: zero for future milestones, saturating at
/// [`MAX_FOUNDATION_AGE_DIFF`] months overdue.
pub fn foundation_score(age_difference: f64) -> f64 {
    if age_difference <= 0.0 {
        return 0.0;
    }
    age_difference.min(MAX_FOUNDATION_AGE_DIFF) / MAX_FOUNDATION_AGE_DIFF
}

/// Ranking score for a candidate within its category.
///
/// Foundational candidates rank on raw probability; likely and challenge
/// candidates get a discovery boost that surfaces rarer transitions.
pub fn weighted_score(
    probability: f64,
    discovery_score: f64,
    category: Category,
    discovery_weight: f64,
) -> f64 {
    match category {
        Category::Foundational => probability,
        Category::Likely | Category::Challenge => probability + discovery_weight * discovery_score,
    }
}
