//! Persisted reference artifacts and the in-memory reference store.
//!
//! The analysis step writes its outputs as JSON artifacts in a models
//! directory; at process start those artifacts are loaded once into an
//! immutable [`ReferenceStore`] snapshot that every engine call borrows.
//! Nothing mutates the store after construction, so concurrent readers need
//! no coordination. Live reloading, if ever added, must build a fresh store
//! and publish it via an atomic pointer swap.

mod artifacts;
mod error;

pub use artifacts::{read_manifest, ArtifactManifest, ReferenceArtifacts};
pub use error::StoreError;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use stride_core::{MilestoneId, Transition, TransitionGraph};

/// File name of the mastery ages artifact (required).
pub const MASTERY_AGES_FILE: &str = "mastery_ages.json";
/// File name of the transition graph artifact (required).
pub const TRANSITION_GRAPH_FILE: &str = "transition_graph.json";
/// File name of the observation frequency artifact (required).
pub const FREQUENCIES_FILE: &str = "milestone_frequencies.json";
/// File name of the display name map (optional, produced upstream).
pub const MILESTONE_NAMES_FILE: &str = "milestone_names.json";
/// File name of the activity catalog (optional, produced upstream).
pub const ACTIVITIES_FILE: &str = "activities.json";
/// File name of the build manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Placeholder used when a milestone has no known display name.
pub const UNKNOWN_MILESTONE_NAME: &str = "Unknown milestone";

/// One entry of the activity catalog. Fields other than the target milestone
/// are activity content and not consumed here.
#[derive(Debug, Deserialize)]
struct ActivityRecord {
    target_milestone_id: Option<MilestoneId>,
}

/// Immutable snapshot of the reference data the engine runs on.
///
/// Populated once at startup, read-only thereafter.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    mastery_ages: BTreeMap<MilestoneId, Option<f64>>,
    transitions: TransitionGraph,
    names: HashMap<MilestoneId, String>,
    activities: Option<BTreeSet<MilestoneId>>,
    /// Observation counts normalized by the maximum count, in [0, 1].
    frequency_scores: BTreeMap<MilestoneId, f64>,
}

impl ReferenceStore {
    /// Load the store from a models directory.
    ///
    /// Mastery ages, the transition graph, and observation frequencies are
    /// required; a missing file surfaces as [`StoreError::MissingArtifact`].
    /// Display names and the activity catalog are optional.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();

        let mastery_ages: BTreeMap<MilestoneId, Option<f64>> =
            artifacts::read_required(dir, MASTERY_AGES_FILE).await?;
        let transitions: BTreeMap<MilestoneId, Vec<Transition>> =
            artifacts::read_required(dir, TRANSITION_GRAPH_FILE).await?;
        let frequencies: BTreeMap<MilestoneId, u64> =
            artifacts::read_required(dir, FREQUENCIES_FILE).await?;

        let names: HashMap<MilestoneId, String> =
            match artifacts::read_optional(dir, MILESTONE_NAMES_FILE).await? {
                Some(names) => names,
                None => {
                    warn!(
                        file = MILESTONE_NAMES_FILE,
                        "milestone name map not found, using placeholder names"
                    );
                    HashMap::new()
                }
            };

        let activities: Option<Vec<ActivityRecord>> =
            artifacts::read_optional(dir, ACTIVITIES_FILE).await?;
        let activities = activities.map(|records| {
            records
                .into_iter()
                .filter_map(|record| record.target_milestone_id)
                .collect::<BTreeSet<_>>()
        });

        let store = Self::from_parts(mastery_ages, transitions, names, activities, frequencies);
        info!(
            milestones = store.mastery_ages.len(),
            named = store.names.len(),
            with_activities = store.activities.as_ref().map(BTreeSet::len),
            dir = %dir.display(),
            "reference store loaded"
        );
        Ok(store)
    }

    /// Assemble a store from already-loaded parts.
    ///
    /// Frequency counts are normalized by the maximum count here, once, so the
    /// per-request path never touches raw counts.
    pub fn from_parts(
        mastery_ages: BTreeMap<MilestoneId, Option<f64>>,
        transitions: TransitionGraph,
        names: HashMap<MilestoneId, String>,
        activities: Option<BTreeSet<MilestoneId>>,
        frequencies: BTreeMap<MilestoneId, u64>,
    ) -> Self {
        let max_count = frequencies.values().copied().max().unwrap_or(0);
        let frequency_scores = frequencies
            .into_iter()
            .map(|(id, count)| {
                let score = if max_count > 0 {
                    count as f64 / max_count as f64
                } else {
                    0.0
                };
                (id, score)
            })
            .collect();

        Self {
            mastery_ages,
            transitions,
            names,
            activities,
            frequency_scores,
        }
    }

    /// Typical mastery age for a milestone, when the cohort showed one.
    pub fn mastery_age(&self, milestone: &MilestoneId) -> Option<f64> {
        self.mastery_ages.get(milestone).copied().flatten()
    }

    /// Iterate all milestones with their optional mastery ages.
    pub fn mastery_ages(&self) -> impl Iterator<Item = (&MilestoneId, Option<f64>)> {
        self.mastery_ages.iter().map(|(id, age)| (id, *age))
    }

    /// Number of milestones in the reference universe.
    pub fn milestone_count(&self) -> usize {
        self.mastery_ages.len()
    }

    /// Outgoing transition distribution for a milestone (empty when unknown).
    pub fn transitions_from(&self, milestone: &MilestoneId) -> &[Transition] {
        self.transitions
            .get(milestone)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of milestones with a non-empty transition distribution.
    pub fn transition_source_count(&self) -> usize {
        self.transitions.values().filter(|t| !t.is_empty()).count()
    }

    /// Display name for a milestone, falling back to a placeholder.
    pub fn display_name(&self, milestone: &MilestoneId) -> String {
        self.names
            .get(milestone)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_MILESTONE_NAME.to_string())
    }

    /// Whether a real (non-placeholder) display name is known.
    pub fn has_display_name(&self, milestone: &MilestoneId) -> bool {
        self.names.contains_key(milestone)
    }

    /// Milestones with supporting activity content, when the catalog exists.
    pub fn activities(&self) -> Option<&BTreeSet<MilestoneId>> {
        self.activities.as_ref()
    }

    /// Normalized observation frequency in [0, 1]; the cold-start
    /// "probability" proxy.
    pub fn frequency_score(&self, milestone: &MilestoneId) -> f64 {
        self.frequency_scores.get(milestone).copied().unwrap_or(0.0)
    }
}
