//! Domain-diversity-constrained greedy selection.
//!
//! One shared routine for the warm-start, cold-start, and backfill paths: walk
//! a ranked pool, prefer candidates whose domain is not yet represented, and
//! only allow a repeat domain when the pool has no unrepresented-domain
//! candidate left.

use std::collections::BTreeSet;

use stride_core::{Domain, MilestoneId};

use crate::candidate::Candidate;

pub(crate) struct DiversitySelector {
    limit: usize,
    picked: Vec<Candidate>,
    picked_ids: BTreeSet<MilestoneId>,
    picked_domains: BTreeSet<Domain>,
}

impl DiversitySelector {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            picked: Vec::new(),
            picked_ids: BTreeSet::new(),
            picked_domains: BTreeSet::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.picked.len() >= self.limit
    }

    pub fn contains(&self, id: &MilestoneId) -> bool {
        self.picked_ids.contains(id)
    }

    pub fn into_picked(self) -> Vec<Candidate> {
        self.picked
    }

    /// Pick the best admissible candidate from a ranked category pool.
    ///
    /// Skips candidates whose domain is already represented while an
    /// unrepresented-domain alternative remains unpicked in the pool.
    pub fn try_pick(&mut self, pool: &[Candidate]) -> bool {
        if self.is_full() {
            return false;
        }
        for candidate in pool {
            if self.picked_ids.contains(&candidate.id) {
                continue;
            }
            if !self.picked.is_empty() && self.picked_domains.contains(&candidate.domain) {
                let alternative_exists = pool.iter().any(|other| {
                    !self.picked_ids.contains(&other.id)
                        && !self.picked_domains.contains(&other.domain)
                });
                if alternative_exists {
                    continue;
                }
            }
            self.admit(candidate.clone(), true);
            return true;
        }
        false
    }

    /// Admit a backfill candidate under the relaxed rule: unrepresented
    /// domains are admitted outright, and a repeat domain is accepted only
    /// when the pool holds no unrepresented-domain candidate at all.
    pub fn backfill_pick(&mut self, candidate: &Candidate, pool: &[Candidate]) -> bool {
        if self.is_full() || self.picked_ids.contains(&candidate.id) {
            return false;
        }
        if !self.picked_domains.contains(&candidate.domain) || self.picked_domains.len() >= 3 {
            self.admit(candidate.clone(), true);
            return true;
        }
        let alternative_exists = pool
            .iter()
            .any(|other| !self.picked_domains.contains(&other.domain));
        if !alternative_exists {
            self.admit(candidate.clone(), false);
            return true;
        }
        false
    }

    fn admit(&mut self, candidate: Candidate, track_domain: bool) {
        self.picked_ids.insert(candidate.id.clone());
        if track_domain {
            self.picked_domains.insert(candidate.domain);
        }
        self.picked.push(candidate);
    }
}
