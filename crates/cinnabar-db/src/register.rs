//! Flat last-writer-wins register map.
//!
//! Each field is an independently versioned register: a write replaces the
//! stored value only when its clock strictly dominates under the shared
//! clock total order. Local writes always land (a fresh local tick always
//! dominates); remote writes race deterministically.

use cinnabar_compaction::MapSnapshot;
use cinnabar_core::{ActorId, Field, LogicalClock, Operation};
use cinnabar_oplog::OperationLog;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A convergent key/value map of last-writer-wins fields.
#[derive(Clone, Debug)]
pub struct LwwMap<V> {
    clock: LogicalClock,
    fields: BTreeMap<String, Field<V>>,
    log: OperationLog<V>,
}

impl<V: Clone + PartialEq> LwwMap<V> {
    pub fn new(actor: ActorId) -> Self {
        LwwMap {
            clock: LogicalClock::new(actor),
            fields: BTreeMap::new(),
            log: OperationLog::new(),
        }
    }

    pub fn actor(&self) -> &ActorId {
        self.clock.actor()
    }

    /// The owning actor's current Lamport value.
    pub fn lamport(&self) -> u64 {
        self.clock.lamport()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Write a field. The local copy is replaced unconditionally — the
    /// fresh clock dominates everything this replica has seen.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let clock = self.clock.tick();
        self.fields.insert(
            key.clone(),
            Field {
                value: value.clone(),
                clock: clock.clone(),
            },
        );
        self.log.record(Operation::FieldSet { key, value, clock });
    }

    /// Rewrite a field through `f`, which receives the current value if
    /// the field exists.
    pub fn update(&mut self, key: impl Into<String>, f: impl FnOnce(Option<&V>) -> V) {
        let key = key.into();
        let value = f(self.get(&key));
        self.set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.fields.get(key).map(|field| &field.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.fields.iter().map(|(key, field)| (key, &field.value))
    }

    /// Current field values, without their clocks.
    pub fn to_map(&self) -> BTreeMap<String, V> {
        self.fields
            .iter()
            .map(|(key, field)| (key.clone(), field.value.clone()))
            .collect()
    }

    /// Merge a batch of remote operations; see
    /// [`Sequence::apply_remote`](crate::Sequence::apply_remote) for the
    /// shared discipline. A field is replaced only when the incoming clock
    /// strictly dominates the stored one (or the field is new).
    pub fn apply_remote(&mut self, ops: &[Operation<V>]) -> Vec<Operation<V>> {
        let mut applied = Vec::new();

        for op in ops {
            if !self.log.remember(op.id()) {
                trace!(op = %op.id(), "already applied, skipping");
                continue;
            }
            self.clock.observe(op.lamport());

            match op {
                Operation::FieldSet { key, value, clock } => {
                    let wins = self
                        .fields
                        .get(key)
                        .map_or(true, |field| *clock > field.clock);
                    if wins {
                        self.fields.insert(
                            key.clone(),
                            Field {
                                value: value.clone(),
                                clock: clock.clone(),
                            },
                        );
                        applied.push(op.clone());
                    } else {
                        trace!(key = %key, "field write lost last-writer-wins");
                    }
                }
                other => {
                    debug!(op = %other.id(), "sequence operation dropped by register map");
                }
            }
        }

        applied
    }

    /// Drain locally produced operations for transmission. One-shot.
    pub fn export_operations(&mut self) -> Vec<Operation<V>> {
        self.log.drain()
    }

    pub fn pending_operations(&self) -> usize {
        self.log.pending()
    }

    pub fn to_snapshot(&self) -> MapSnapshot<V> {
        MapSnapshot::new(
            self.clock.actor().clone(),
            self.clock.lamport(),
            self.fields.clone(),
        )
    }

    /// Reconstruct from a snapshot: Lamport counter resumed, unsent buffer
    /// empty, dedup set reseeded from the snapshot's clocks.
    pub fn from_snapshot(snapshot: MapSnapshot<V>) -> Self {
        let log = OperationLog::seeded(snapshot.known_ids());
        LwwMap {
            clock: LogicalClock::resume(snapshot.actor.clone(), snapshot.lamport),
            fields: snapshot.fields,
            log,
        }
    }

    /// Bootstrap a new replica from another replica's snapshot; the
    /// Lamport counter resumes past everything the snapshot carries.
    pub fn from_snapshot_as(snapshot: MapSnapshot<V>, actor: ActorId) -> Self {
        let mut map = Self::from_snapshot(snapshot);
        map.clock = LogicalClock::resume(actor, map.clock.lamport());
        map
    }
}
