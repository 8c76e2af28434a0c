//! Replicated ordered sequence with tombstones and dense position keys.
//!
//! Elements carry an immutable identity and a mutable, totally ordered
//! position key. Replicas converge because identity, position, and the
//! clock total order are interpreted identically everywhere, whatever the
//! delivery order; re-delivery is absorbed by the operation log's dedup
//! set and by idempotent per-element rules.
//!
//! All index arguments address the visible subsequence (tombstones are
//! skipped). Out-of-bounds mutator indices are host bugs and fail with
//! [`DbError::IndexOutOfBounds`]; they are never clamped.

use crate::error::{DbError, Result};
use cinnabar_compaction::SequenceSnapshot;
use cinnabar_core::{ActorId, Clock, Element, ElementId, LogicalClock, Operation, PositionKey};
use cinnabar_oplog::OperationLog;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, trace};

/// An ordered, mutable, convergent collection.
///
/// Backing layout: an arena of elements keyed by id plus a separately
/// maintained id vector sorted by `(pos, id)` — binary-search locate,
/// splice insert. Concurrent inserts that allocate the same position key
/// tie-break on element id, identically on every replica.
#[derive(Clone, Debug)]
pub struct Sequence<V> {
    clock: LogicalClock,
    elements: HashMap<ElementId, Element<V>>,
    order: Vec<ElementId>,
    log: OperationLog<V>,
}

impl<V: Clone + PartialEq> Sequence<V> {
    pub fn new(actor: ActorId) -> Self {
        Sequence {
            clock: LogicalClock::new(actor),
            elements: HashMap::new(),
            order: Vec::new(),
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

    /// Number of visible elements.
    pub fn len(&self) -> usize {
        self.visible_ids().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `value` so it becomes the visible element at `index`.
    pub fn insert(&mut self, index: usize, value: V) -> Result<()> {
        let length = self.len();
        if index > length {
            return Err(DbError::IndexOutOfBounds { index, length });
        }

        let (left, right) = self.neighbor_keys(index, None);
        let pos = PositionKey::between(left.as_ref(), right.as_ref(), self.clock.actor());
        let clock = self.clock.tick();
        let id = clock.op_id();

        self.integrate(Element::new(pos.clone(), value.clone(), clock.clone()));
        self.log.record(Operation::Insert {
            target: id,
            pos,
            value,
            clock,
        });
        Ok(())
    }

    pub fn push(&mut self, value: V) -> Result<()> {
        self.insert(self.len(), value)
    }

    /// Tombstone the visible element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let id = self
            .visible_id_at(index)
            .ok_or(DbError::IndexOutOfBounds {
                index,
                length: self.len(),
            })?;
        let clock = self.clock.tick();
        self.tombstone(&id, &clock);
        self.log.record(Operation::Remove { target: id, clock });
        Ok(())
    }

    /// Re-position the visible element at `from` so it lands at `to`.
    /// Identity is preserved; only the position key changes.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let length = self.len();
        let id = self.visible_id_at(from).ok_or(DbError::IndexOutOfBounds {
            index: from,
            length,
        })?;
        if to >= length {
            return Err(DbError::IndexOutOfBounds { index: to, length });
        }

        // The element is leaving its own slot, so it is excluded when
        // resolving the neighbors that will surround it at `to`.
        let (left, right) = self.neighbor_keys(to, Some(&id));
        let pos = PositionKey::between(left.as_ref(), right.as_ref(), self.clock.actor());
        let clock = self.clock.tick();

        self.reposition(&id, pos.clone(), clock.clone());
        self.log.record(Operation::Move { target: id, pos, clock });
        Ok(())
    }

    /// Rewrite the visible element at `index` through `f`. Runs through
    /// the same last-writer-wins gate the merge path applies; a fresh
    /// local clock always dominates, so the local write always lands.
    pub fn update(&mut self, index: usize, f: impl FnOnce(&V) -> V) -> Result<()> {
        let id = self
            .visible_id_at(index)
            .ok_or(DbError::IndexOutOfBounds {
                index,
                length: self.len(),
            })?;
        let clock = self.clock.tick();

        let mut recorded = None;
        if let Some(element) = self.elements.get_mut(&id) {
            let value = f(&element.value);
            if clock > element.clock {
                element.value = value.clone();
                element.clock = clock.clone();
            }
            recorded = Some(value);
        }
        if let Some(value) = recorded {
            self.log.record(Operation::Update {
                target: id,
                value,
                clock,
            });
        }
        Ok(())
    }

    /// Visible element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&V> {
        let id = self.visible_ids().nth(index)?;
        self.elements.get(id).map(|e| &e.value)
    }

    /// Iterate over visible values in order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.order
            .iter()
            .filter_map(move |id| self.elements.get(id))
            .filter(|e| e.visible())
            .map(|e| &e.value)
    }

    pub fn to_vec(&self) -> Vec<V> {
        self.iter().cloned().collect()
    }

    /// Merge a batch of remote operations. Each operation is applied at
    /// most once (dedup by identity); inserts are idempotent by element
    /// id; removes tombstone unconditionally; moves and updates apply only
    /// when their clock dominates the element's. Operations referencing
    /// unknown targets are dropped silently — their insert has not arrived
    /// yet, and a later re-send or snapshot resync recovers them.
    ///
    /// Returns the operations that actually changed state.
    pub fn apply_remote(&mut self, ops: &[Operation<V>]) -> Vec<Operation<V>> {
        let mut applied = Vec::new();

        for op in ops {
            if !self.log.remember(op.id()) {
                trace!(op = %op.id(), "already applied, skipping");
                continue;
            }
            self.clock.observe(op.lamport());

            match op {
                Operation::Insert {
                    target,
                    pos,
                    value,
                    clock,
                } => {
                    if self.elements.contains_key(target) {
                        // The same insert arrived via two paths.
                        trace!(element = %target, "insert for existing element ignored");
                        continue;
                    }
                    self.integrate(Element {
                        id: target.clone(),
                        pos: pos.clone(),
                        value: value.clone(),
                        deleted: false,
                        clock: clock.clone(),
                        pos_clock: clock.clone(),
                    });
                    applied.push(op.clone());
                }
                Operation::Remove { target, clock } => {
                    if !self.elements.contains_key(target) {
                        debug!(element = %target, "remove for unknown element dropped");
                    } else if self.tombstone(target, clock) {
                        applied.push(op.clone());
                    }
                }
                Operation::Move { target, pos, clock } => {
                    match self.elements.get(target).map(|e| *clock > e.pos_clock) {
                        Some(true) => {
                            self.reposition(target, pos.clone(), clock.clone());
                            applied.push(op.clone());
                        }
                        Some(false) => trace!(element = %target, "move lost last-writer-wins"),
                        None => debug!(element = %target, "move for unknown element dropped"),
                    }
                }
                Operation::Update {
                    target,
                    value,
                    clock,
                } => match self.elements.get_mut(target) {
                    Some(element) if *clock > element.clock => {
                        element.value = value.clone();
                        element.clock = clock.clone();
                        applied.push(op.clone());
                    }
                    Some(_) => trace!(element = %target, "update lost last-writer-wins"),
                    None => debug!(element = %target, "update for unknown element dropped"),
                },
                Operation::FieldSet { key, .. } => {
                    debug!(key = %key, "register operation dropped by sequence");
                }
            }
        }

        applied
    }

    /// Drain locally produced operations for transmission. One-shot:
    /// calling twice without new mutations returns an empty batch.
    pub fn export_operations(&mut self) -> Vec<Operation<V>> {
        self.log.drain()
    }

    /// Number of buffered, not-yet-exported operations.
    pub fn pending_operations(&self) -> usize {
        self.log.pending()
    }

    /// Capture full state, tombstones included, plus the Lamport counter.
    pub fn to_snapshot(&self) -> SequenceSnapshot<V> {
        let elements = self
            .order
            .iter()
            .filter_map(|id| self.elements.get(id))
            .cloned()
            .collect();
        SequenceSnapshot::new(self.clock.actor().clone(), self.clock.lamport(), elements)
    }

    /// Reconstruct a container from a snapshot. The Lamport counter
    /// resumes where the snapshot left off; the unsent buffer starts
    /// empty; the replay-dedup set is reseeded from the snapshot's clocks.
    pub fn from_snapshot(snapshot: SequenceSnapshot<V>) -> Self {
        let log = OperationLog::seeded(snapshot.known_ids());
        let clock = LogicalClock::resume(snapshot.actor.clone(), snapshot.lamport);

        let mut elements = snapshot.elements;
        elements.sort_by(|a, b| a.pos.cmp(&b.pos).then_with(|| a.id.cmp(&b.id)));

        let mut sequence = Sequence {
            clock,
            elements: HashMap::with_capacity(elements.len()),
            order: Vec::with_capacity(elements.len()),
            log,
        };
        for element in elements {
            sequence.order.push(element.id.clone());
            sequence.elements.insert(element.id.clone(), element);
        }
        sequence
    }

    /// Bootstrap a new replica from another replica's snapshot. State and
    /// dedup knowledge are adopted wholesale; the Lamport counter resumes
    /// past everything the snapshot carries, so the new actor's first
    /// writes dominate it.
    pub fn from_snapshot_as(snapshot: SequenceSnapshot<V>, actor: ActorId) -> Self {
        let mut sequence = Self::from_snapshot(snapshot);
        sequence.clock = LogicalClock::resume(actor, sequence.clock.lamport());
        sequence
    }

    fn visible_ids(&self) -> impl Iterator<Item = &ElementId> {
        self.order
            .iter()
            .filter(move |id| self.elements.get(*id).map_or(false, |e| e.visible()))
    }

    fn visible_id_at(&self, index: usize) -> Option<ElementId> {
        self.visible_ids().nth(index).cloned()
    }

    /// Position keys of the visible neighbors around slot `index`,
    /// optionally resolving as if `excluding` were absent.
    fn neighbor_keys(
        &self,
        index: usize,
        excluding: Option<&ElementId>,
    ) -> (Option<PositionKey>, Option<PositionKey>) {
        let ids: Vec<&ElementId> = self
            .visible_ids()
            .filter(|id| excluding.map_or(true, |ex| *id != ex))
            .collect();

        let key_of = |id: &&ElementId| self.elements.get(*id).map(|e| e.pos.clone());
        let left = index.checked_sub(1).and_then(|i| ids.get(i)).and_then(key_of);
        let right = ids.get(index).and_then(key_of);
        (left, right)
    }

    /// Slot in `order` for an element with this `(pos, id)` sort key.
    fn ordered_slot(&self, pos: &PositionKey, id: &ElementId) -> usize {
        let found = self.order.binary_search_by(|probe| {
            match self.elements.get(probe) {
                Some(e) => e.pos.cmp(pos).then_with(|| e.id.cmp(id)),
                // Ids in `order` always resolve; sort unknowns low so the
                // search still terminates.
                None => Ordering::Less,
            }
        });
        match found {
            Ok(at) | Err(at) => at,
        }
    }

    fn integrate(&mut self, element: Element<V>) {
        let at = self.ordered_slot(&element.pos, &element.id);
        self.order.insert(at, element.id.clone());
        self.elements.insert(element.id.clone(), element);
    }

    fn locate(&self, id: &ElementId) -> Option<usize> {
        let element = self.elements.get(id)?;
        let at = self.ordered_slot(&element.pos, &element.id);
        if self.order.get(at) == Some(id) {
            Some(at)
        } else {
            None
        }
    }

    /// Tombstone an element. Deletion is unconditional (no clock contest),
    /// but the winning clock is folded into the element so a frontier
    /// derived from a snapshot covers the remove itself. Returns `false`
    /// when the element was already deleted.
    fn tombstone(&mut self, id: &ElementId, clock: &Clock) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                if *clock > element.clock {
                    element.clock = clock.clone();
                }
                if element.deleted {
                    false
                } else {
                    element.deleted = true;
                    true
                }
            }
            None => false,
        }
    }

    fn reposition(&mut self, id: &ElementId, pos: PositionKey, clock: Clock) {
        if let Some(at) = self.locate(id) {
            self.order.remove(at);
        }
        if let Some(element) = self.elements.get_mut(id) {
            element.pos = pos;
            element.pos_clock = clock;
        }
        if let Some((pos, eid)) = self.elements.get(id).map(|e| (e.pos.clone(), e.id.clone())) {
            let at = self.ordered_slot(&pos, &eid);
            self.order.insert(at, eid);
        }
    }
}
