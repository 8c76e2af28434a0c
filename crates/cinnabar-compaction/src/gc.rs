//! Tombstone garbage collection, gated on replica convergence.
//!
//! Dropping a tombstone erases the only evidence that an element ever
//! existed: a late retransmission touching the collected id can no longer
//! be recognized as already-handled and is silently dropped by the merge
//! path instead. That is only acceptable once every replica has absorbed
//! the state being collected, so the [`Compactor`] tracks peer frontiers
//! and refuses to collect ahead of them.

use crate::snapshot::SequenceSnapshot;
use crate::version_vector::VersionVector;
use cinnabar_core::{ActorId, Element};
use std::collections::BTreeMap;

/// Drop tombstoned elements from a snapshot and re-sort the survivors by
/// position. Unconditional; prefer [`Compactor::gc_when_stable`] when peers
/// exist.
pub fn gc_sequence_snapshot<V: Clone>(snapshot: &SequenceSnapshot<V>) -> SequenceSnapshot<V> {
    let mut survivors: Vec<Element<V>> = snapshot
        .elements
        .iter()
        .filter(|element| element.visible())
        .cloned()
        .collect();
    survivors.sort_by(|a, b| a.pos.cmp(&b.pos).then_with(|| a.id.cmp(&b.id)));

    SequenceSnapshot {
        version: snapshot.version,
        actor: snapshot.actor.clone(),
        lamport: snapshot.lamport,
        elements: survivors,
    }
}

/// Gates tombstone GC on convergence: a snapshot may be collected only
/// once every registered peer's frontier dominates it.
///
/// A host with no peers (single-replica document) may leave the peer set
/// empty, in which case every snapshot is trivially stable.
#[derive(Clone, Debug, Default)]
pub struct Compactor {
    /// Last reported frontier per peer.
    peers: BTreeMap<ActorId, VersionVector>,
}

impl Compactor {
    pub fn new() -> Self {
        Compactor {
            peers: BTreeMap::new(),
        }
    }

    /// Start tracking a peer. Until its first report it is assumed to have
    /// seen nothing, which blocks GC.
    pub fn register_peer(&mut self, peer: ActorId) {
        self.peers.entry(peer).or_default();
    }

    /// Fold in a frontier reported by a peer. Frontiers only advance.
    pub fn update_peer(&mut self, peer: ActorId, frontier: &VersionVector) {
        self.peers.entry(peer).or_default().merge(frontier);
    }

    pub fn peer_frontier(&self, peer: &ActorId) -> Option<&VersionVector> {
        self.peers.get(peer)
    }

    pub fn peers(&self) -> impl Iterator<Item = &ActorId> {
        self.peers.keys()
    }

    /// True when every registered peer has absorbed everything `frontier`
    /// covers.
    pub fn is_stable(&self, frontier: &VersionVector) -> bool {
        self.peers.values().all(|peer| peer.dominates(frontier))
    }

    /// GC a snapshot if every registered peer has converged past it;
    /// otherwise leave it alone and return `None`.
    pub fn gc_when_stable<V: Clone>(
        &self,
        snapshot: &SequenceSnapshot<V>,
    ) -> Option<SequenceSnapshot<V>> {
        if self.is_stable(&snapshot.version_vector()) {
            Some(gc_sequence_snapshot(snapshot))
        } else {
            None
        }
    }
}
