//! Version vectors: the highest Lamport value seen per actor.
//!
//! A version vector summarizes how much of each actor's history a replica
//! (or a snapshot) has absorbed. Tombstone GC uses dominance between these
//! summaries to decide when collecting is safe.

use cinnabar_core::{ActorId, Clock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-actor frontier of absorbed operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionVector {
    entries: BTreeMap<ActorId, u64>,
}

impl VersionVector {
    pub fn new() -> Self {
        VersionVector {
            entries: BTreeMap::new(),
        }
    }

    /// Build a frontier from a set of clocks (e.g. everything a snapshot
    /// carries).
    pub fn from_clocks<'a>(clocks: impl IntoIterator<Item = &'a Clock>) -> Self {
        let mut vv = VersionVector::new();
        for clock in clocks {
            vv.observe(clock);
        }
        vv
    }

    /// Highest Lamport value seen from an actor (0 when unseen).
    pub fn get(&self, actor: &ActorId) -> u64 {
        self.entries.get(actor).copied().unwrap_or(0)
    }

    /// Record a Lamport value for an actor, keeping the maximum.
    pub fn record(&mut self, actor: ActorId, lamport: u64) {
        if lamport == 0 {
            return;
        }
        let entry = self.entries.entry(actor).or_insert(0);
        *entry = (*entry).max(lamport);
    }

    /// Fold one clock into the frontier.
    pub fn observe(&mut self, clock: &Clock) {
        self.record(clock.actor.clone(), clock.lamport);
    }

    /// True when this frontier has seen at least as much as `other` from
    /// every actor.
    pub fn dominates(&self, other: &VersionVector) -> bool {
        other
            .entries
            .iter()
            .all(|(actor, &lamport)| self.get(actor) >= lamport)
    }

    /// Component-wise maximum with another frontier.
    pub fn merge(&mut self, other: &VersionVector) {
        for (actor, &lamport) in &other.entries {
            self.record(actor.clone(), lamport);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActorId, &u64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
