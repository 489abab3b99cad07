//! Store error type.

use std::path::PathBuf;

/// Errors raised while persisting or loading reference artifacts.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required reference artifact is absent. Recommendations without the
    /// statistical model are meaningless, so this is surfaced to the caller
    /// rather than silently degraded.
    #[error("required artifact {name} not found at {path} (run the analysis step first)")]
    MissingArtifact {
        /// Artifact file name
        name: &'static str,
        /// Full path that was probed
        path: PathBuf,
    },
}
