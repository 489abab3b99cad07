//! Milestone identifiers and developmental domains.

use serde::{Deserialize, Serialize};

/// Prefix shared by all milestone identifiers in the cohort dataset.
///
/// Milestone codes follow the pattern `ddi<domain><type><number>`, e.g.
/// `ddigmd055` or `ddicmm030`.
pub const MILESTONE_PREFIX: &str = "ddi";

/// Byte index of the domain character within a milestone identifier.
const DOMAIN_CHAR_INDEX: usize = 3;

/// Stable identifier for a developmental milestone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneId(String);

impl MilestoneId {
    /// Create an identifier from a code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Developmental domain encoded in the identifier.
    pub fn domain(&self) -> Domain {
        Domain::of(self)
    }
}

impl std::fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for MilestoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MilestoneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Coarse developmental domain of a milestone.
///
/// Used by the recommendation engine to enforce domain diversity across a
/// recommendation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Cognitive development (`c`)
    Cognitive,
    /// Fine motor development (`f`)
    FineMotor,
    /// Gross motor development (`g`)
    GrossMotor,
    /// Malformed identifier or unrecognized domain character
    Unknown,
}

impl Domain {
    /// Derive the domain from the fixed character position in the identifier.
    ///
    /// Total function: malformed or short identifiers map to [`Domain::Unknown`].
    pub fn of(id: &MilestoneId) -> Self {
        match id.as_str().as_bytes().get(DOMAIN_CHAR_INDEX) {
            Some(b'c') | Some(b'C') => Domain::Cognitive,
            Some(b'f') | Some(b'F') => Domain::FineMotor,
            Some(b'g') | Some(b'G') => Domain::GrossMotor,
            _ => Domain::Unknown,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Domain::Cognitive => "cognitive",
            Domain::FineMotor => "fine_motor",
            Domain::GrossMotor => "gross_motor",
            Domain::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
