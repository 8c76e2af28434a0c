//! Lamport clocks and the total order that drives every merge decision.
//!
//! Each container instance owns one `LogicalClock`. Local mutations call
//! [`LogicalClock::tick`]; ingesting a remote operation calls
//! [`LogicalClock::observe`] first, so all later local ticks causally
//! dominate everything seen so far.
//!
//! The order on [`Clock`] (lamport, then actor) is interpreted identically
//! on every replica. It is the sole source of merge determinism.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use ulid::Ulid;

/// Identifier for an editing actor: a browser tab, a device, a server
/// process. Compared lexicographically when breaking Lamport ties.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh, collision-resistant actor id.
    pub fn random() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A single event stamp: Lamport counter, wall-clock milliseconds, and the
/// actor that produced it.
///
/// Ordering compares `lamport` first and breaks ties on `actor`. The
/// `timestamp` is carried for display and debugging; it participates only
/// as a final tie-break so the order stays consistent with equality, and it
/// never decides between two distinct events (no two clocks share the same
/// `(lamport, actor)` pair).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clock {
    /// Per-actor Lamport counter, strictly increasing for a given actor.
    pub lamport: u64,
    /// Wall-clock milliseconds since the Unix epoch at stamp time.
    pub timestamp: i64,
    /// The actor that produced this stamp.
    pub actor: ActorId,
}

impl Clock {
    /// The replay-dedup identity of the operation this clock stamps.
    pub fn op_id(&self) -> OpId {
        OpId {
            lamport: self.lamport,
            actor: self.actor.clone(),
        }
    }
}

impl PartialOrd for Clock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Clock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lamport
            .cmp(&other.lamport)
            .then_with(|| self.actor.cmp(&other.actor))
            .then_with(|| self.timestamp.cmp(&other.timestamp))
    }
}

/// Identity of an operation: `(actor, lamport)` pairs are globally unique
/// and never reused. Also serves as [`ElementId`](crate::ElementId) for the
/// element an `Insert` creates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId {
    pub lamport: u64,
    pub actor: ActorId,
}

impl OpId {
    pub fn new(actor: impl Into<ActorId>, lamport: u64) -> Self {
        Self {
            lamport,
            actor: actor.into(),
        }
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lamport
            .cmp(&other.lamport)
            .then_with(|| self.actor.cmp(&other.actor))
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor, self.lamport)
    }
}

/// Per-actor Lamport counter. One lives inside every container instance;
/// there is no shared or process-wide clock state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogicalClock {
    actor: ActorId,
    lamport: u64,
}

impl LogicalClock {
    pub fn new(actor: ActorId) -> Self {
        Self { actor, lamport: 0 }
    }

    /// Resume a counter from a persisted value (snapshot restore), so
    /// future ticks continue where the snapshot left off.
    pub fn resume(actor: ActorId, lamport: u64) -> Self {
        Self { actor, lamport }
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// The highest Lamport value this counter has produced or observed.
    pub fn lamport(&self) -> u64 {
        self.lamport
    }

    /// Stamp a local mutation. The counter strictly increases, so any two
    /// stamps from the same actor are ordered by construction.
    pub fn tick(&mut self) -> Clock {
        self.lamport += 1;
        Clock {
            lamport: self.lamport,
            timestamp: Utc::now().timestamp_millis(),
            actor: self.actor.clone(),
        }
    }

    /// Fold a remotely observed Lamport value into the counter, so every
    /// subsequent local tick dominates the observed event.
    pub fn observe(&mut self, remote_lamport: u64) {
        self.lamport = self.lamport.max(remote_lamport);
    }
}
