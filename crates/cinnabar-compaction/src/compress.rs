//! Operation-batch compression.
//!
//! Reduces a batch to a smaller, semantically equivalent one before
//! transmission: one insert per element with the latest update/move folded
//! in, insert+remove pairs cancelled outright, one remove per surviving
//! tombstone, one write per register key. Cancellation only ever applies
//! within the batch being compressed — operations already sent in earlier
//! batches are not its concern.

use cinnabar_core::{Clock, ElementId, Operation, PositionKey};
use std::collections::BTreeMap;

/// Everything one batch says about a single element.
struct ElementOps<V> {
    insert: Option<(PositionKey, V, Clock)>,
    remove: Option<Clock>,
    update: Option<(V, Clock)>,
    moved: Option<(PositionKey, Clock)>,
}

impl<V> ElementOps<V> {
    fn empty() -> Self {
        ElementOps {
            insert: None,
            remove: None,
            update: None,
            moved: None,
        }
    }
}

/// Compress a batch into a minimal equivalent set, sorted by
/// `(lamport, actor)` so replay order is deterministic.
///
/// Applying the output to a replica that has seen none of the batch yields
/// the same visible state as applying the input.
pub fn compress<V: Clone>(ops: &[Operation<V>]) -> Vec<Operation<V>> {
    let mut elements: BTreeMap<ElementId, ElementOps<V>> = BTreeMap::new();
    let mut fields: BTreeMap<String, (V, Clock)> = BTreeMap::new();

    for op in ops {
        match op {
            Operation::Insert {
                target,
                pos,
                value,
                clock,
            } => {
                let entry = elements
                    .entry(target.clone())
                    .or_insert_with(ElementOps::empty);
                // A second insert for the same id is a replay; the first
                // one carries the identity.
                if entry.insert.is_none() {
                    entry.insert = Some((pos.clone(), value.clone(), clock.clone()));
                }
            }
            Operation::Remove { target, clock } => {
                let entry = elements
                    .entry(target.clone())
                    .or_insert_with(ElementOps::empty);
                if entry.remove.as_ref().map_or(true, |kept| kept < clock) {
                    entry.remove = Some(clock.clone());
                }
            }
            Operation::Move { target, pos, clock } => {
                let entry = elements
                    .entry(target.clone())
                    .or_insert_with(ElementOps::empty);
                if entry.moved.as_ref().map_or(true, |(_, kept)| kept < clock) {
                    entry.moved = Some((pos.clone(), clock.clone()));
                }
            }
            Operation::Update {
                target,
                value,
                clock,
            } => {
                let entry = elements
                    .entry(target.clone())
                    .or_insert_with(ElementOps::empty);
                if entry.update.as_ref().map_or(true, |(_, kept)| kept < clock) {
                    entry.update = Some((value.clone(), clock.clone()));
                }
            }
            Operation::FieldSet { key, value, clock } => {
                if fields.get(key).map_or(true, |(_, kept)| kept < clock) {
                    fields.insert(key.clone(), (value.clone(), clock.clone()));
                }
            }
        }
    }

    let mut out = Vec::new();

    for (id, entry) in elements {
        if entry.insert.is_some() && entry.remove.is_some() {
            // Inserted and removed within this batch: no wire effect, and
            // any moves or updates in between go with it.
            continue;
        }

        if let Some((pos, value, clock)) = entry.insert {
            // Fold the latest reposition and rewrite onto the insert; the
            // insert's clock is the element's identity and stays.
            let pos = entry.moved.map(|(p, _)| p).unwrap_or(pos);
            let value = entry.update.map(|(v, _)| v).unwrap_or(value);
            out.push(Operation::Insert {
                target: id,
                pos,
                value,
                clock,
            });
        } else {
            // The element predates this batch; ship the survivors
            // standalone.
            if let Some((value, clock)) = entry.update {
                out.push(Operation::Update {
                    target: id.clone(),
                    value,
                    clock,
                });
            }
            if let Some((pos, clock)) = entry.moved {
                out.push(Operation::Move {
                    target: id.clone(),
                    pos,
                    clock,
                });
            }
            if let Some(clock) = entry.remove {
                out.push(Operation::Remove { target: id, clock });
            }
        }
    }

    for (key, (value, clock)) in fields {
        out.push(Operation::FieldSet { key, value, clock });
    }

    out.sort_by(|a, b| a.id().cmp(&b.id()));
    out
}
