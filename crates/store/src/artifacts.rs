//! Reading and writing the persisted reference artifacts.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use stride_core::{round_dp, MilestoneId, Transition, TransitionGraph};

use crate::{
    StoreError, FREQUENCIES_FILE, MANIFEST_FILE, MASTERY_AGES_FILE, TRANSITION_GRAPH_FILE,
};

/// Build metadata written alongside the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// When the analysis ran
    pub generated_at: DateTime<Utc>,
    /// Subjects in the source cohort
    pub subjects: usize,
    /// Milestones covered by the artifacts
    pub milestones: usize,
}

/// Outputs of the analysis step, ready to persist.
#[derive(Debug, Clone)]
pub struct ReferenceArtifacts {
    /// Milestone id -> median mastery age (months), `None` when unobserved
    pub mastery_ages: BTreeMap<MilestoneId, Option<f64>>,
    /// Milestone id -> ordered next-milestone distribution
    pub transitions: TransitionGraph,
    /// Milestone id -> non-untested observation count
    pub frequencies: BTreeMap<MilestoneId, u64>,
    /// Subjects in the source cohort (manifest metadata)
    pub subjects: usize,
}

impl ReferenceArtifacts {
    /// Write all artifacts plus the manifest into a models directory.
    ///
    /// Transition probabilities are rounded to 4 decimals on the way out, the
    /// same precision the engine later reports.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        write_json(dir, MASTERY_AGES_FILE, &self.mastery_ages).await?;

        let rounded: BTreeMap<&MilestoneId, Vec<Transition>> = self
            .transitions
            .iter()
            .map(|(id, transitions)| {
                let rounded = transitions
                    .iter()
                    .map(|t| Transition {
                        milestone: t.milestone.clone(),
                        probability: round_dp(t.probability, 4),
                    })
                    .collect();
                (id, rounded)
            })
            .collect();
        write_json(dir, TRANSITION_GRAPH_FILE, &rounded).await?;

        write_json(dir, FREQUENCIES_FILE, &self.frequencies).await?;

        let manifest = ArtifactManifest {
            generated_at: Utc::now(),
            subjects: self.subjects,
            milestones: self.mastery_ages.len(),
        };
        write_json(dir, MANIFEST_FILE, &manifest).await?;

        info!(
            milestones = manifest.milestones,
            subjects = manifest.subjects,
            dir = %dir.display(),
            "saved reference artifacts"
        );
        Ok(())
    }
}

async fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(dir.join(name), body.as_bytes()).await?;
    Ok(())
}

/// Read an artifact that must exist.
pub(crate) async fn read_required<T: DeserializeOwned>(
    dir: &Path,
    name: &'static str,
) -> Result<T, StoreError> {
    let path = dir.join(name);
    match fs::read_to_string(&path).await {
        Ok(body) => Ok(serde_json::from_str(&body)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::MissingArtifact { name, path })
        }
        Err(err) => Err(err.into()),
    }
}

/// Read an artifact that may be absent.
pub(crate) async fn read_optional<T: DeserializeOwned>(
    dir: &Path,
    name: &'static str,
) -> Result<Option<T>, StoreError> {
    let path = dir.join(name);
    match fs::read_to_string(&path).await {
        Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Load the manifest written by the last analysis run, if any.
pub async fn read_manifest(dir: impl AsRef<Path>) -> Result<Option<ArtifactManifest>, StoreError> {
    read_optional(dir.as_ref(), MANIFEST_FILE).await
}
