//! Recommendation output records.

use serde::{Deserialize, Serialize};

use crate::MilestoneId;

/// How a recommended milestone relates to the child's age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Past the typical mastery age; the child should catch up
    Foundational,
    /// Age-appropriate natural next step
    Likely,
    /// Ahead of the typical mastery age; advanced development
    Challenge,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Foundational => "foundational",
            Category::Likely => "likely",
            Category::Challenge => "challenge",
        };
        f.write_str(s)
    }
}

/// One recommended milestone.
///
/// `probability` is a transition probability for warm-start recommendations
/// and a normalized observation frequency for cold-start/fallback ones; both
/// are rounded to 4 decimals, `foundation_score` to 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommended milestone id
    pub milestone_id: MilestoneId,
    /// Human-readable name (placeholder when no display name is known)
    pub milestone_name: String,
    /// Transition probability or normalized frequency, 4 decimals
    pub probability: f64,
    /// 1 - probability; rewards rarer/advanced milestones, 4 decimals
    pub discovery_score: f64,
    /// Catch-up urgency in [0, 1], 2 decimals; 0 for future milestones
    pub foundation_score: f64,
    /// Recommendation category
    pub category: Category,
    /// Typical mastery age in months, when known
    pub mastery_age: Option<f64>,
}
