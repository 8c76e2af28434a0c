//! Container snapshots: full-state captures for persistence and for cold
//! bootstrap of new replicas.
//!
//! A snapshot carries everything needed to reconstruct an equivalent
//! container — elements or fields plus the owning actor's Lamport counter —
//! but not the outbound operation buffer, which dies with the process that
//! held it. Snapshots are encoded with a generic structured serialization
//! (JSON) behind a format version byte.

use crate::version_vector::VersionVector;
use cinnabar_core::{ActorId, Element, Field, OpId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Errors that can occur encoding or decoding snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization(err.to_string())
    }
}

/// Full state of a replicated sequence, tombstones included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceSnapshot<V> {
    /// Format version for compatibility checks on restore.
    pub version: u8,
    /// The actor that owns the captured container.
    pub actor: ActorId,
    /// The owning actor's Lamport counter at capture time; restored so
    /// future local ticks continue past everything in this snapshot.
    pub lamport: u64,
    /// All elements, sorted by `(pos, id)`.
    pub elements: Vec<Element<V>>,
}

impl<V> SequenceSnapshot<V> {
    pub fn new(actor: ActorId, lamport: u64, elements: Vec<Element<V>>) -> Self {
        SequenceSnapshot {
            version: SNAPSHOT_VERSION,
            actor,
            lamport,
            elements,
        }
    }

    /// The causal frontier this snapshot covers: every creation id and
    /// last-writer clock it carries, plus the owner's own counter.
    pub fn version_vector(&self) -> VersionVector {
        let mut vv = VersionVector::new();
        vv.record(self.actor.clone(), self.lamport);
        for element in &self.elements {
            let OpId { actor, lamport } = element.id.clone();
            vv.record(actor, lamport);
            vv.observe(&element.clock);
            vv.observe(&element.pos_clock);
        }
        vv
    }

    /// Identities recoverable from this snapshot, used to reseed a
    /// restored container's replay-dedup set.
    pub fn known_ids(&self) -> Vec<OpId> {
        let mut ids = Vec::with_capacity(self.elements.len() * 3);
        for element in &self.elements {
            ids.push(element.id.clone());
            ids.push(element.clock.op_id());
            ids.push(element.pos_clock.op_id());
        }
        ids
    }
}

impl<V: Serialize> SequenceSnapshot<V> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<V: DeserializeOwned> SequenceSnapshot<V> {
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: SequenceSnapshot<V> = serde_json::from_slice(data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}

/// Full state of a register map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot<V> {
    pub version: u8,
    pub actor: ActorId,
    pub lamport: u64,
    pub fields: BTreeMap<String, Field<V>>,
}

impl<V> MapSnapshot<V> {
    pub fn new(actor: ActorId, lamport: u64, fields: BTreeMap<String, Field<V>>) -> Self {
        MapSnapshot {
            version: SNAPSHOT_VERSION,
            actor,
            lamport,
            fields,
        }
    }

    pub fn version_vector(&self) -> VersionVector {
        let mut vv = VersionVector::new();
        vv.record(self.actor.clone(), self.lamport);
        for field in self.fields.values() {
            vv.observe(&field.clock);
        }
        vv
    }

    pub fn known_ids(&self) -> Vec<OpId> {
        self.fields
            .values()
            .map(|field| field.clock.op_id())
            .collect()
    }
}

impl<V: Serialize> MapSnapshot<V> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<V: DeserializeOwned> MapSnapshot<V> {
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: MapSnapshot<V> = serde_json::from_slice(data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}
