//! The unit state both containers replicate: sequence elements and
//! register fields.

use crate::clock::{Clock, OpId};
use crate::position::PositionKey;
use serde::{Deserialize, Serialize};

/// Identity of a sequence element: the `(actor, lamport)` of the clock that
/// created it. Immutable for the element's lifetime.
pub type ElementId = OpId;

/// One slot in a replicated sequence.
///
/// `id` never changes; `pos` may be rewritten by a move. A removed element
/// stays behind as a tombstone (`deleted == true`) so its removal can still
/// be communicated to replicas that have not seen it; only snapshot GC
/// drops it physically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element<V> {
    pub id: ElementId,
    pub pos: PositionKey,
    pub value: V,
    pub deleted: bool,
    /// Clock of the last write that won the value: creation or a
    /// dominating update since. A winning remove folds in here too, so a
    /// frontier derived from a snapshot covers the removal.
    pub clock: Clock,
    /// Clock of the last write that won the position: creation or a
    /// dominating move since. Versioned separately from the value so a
    /// concurrent move and update contest different dimensions and both
    /// land on every replica.
    pub pos_clock: Clock,
}

impl<V> Element<V> {
    /// A freshly inserted element: both dimensions versioned by the
    /// creating clock.
    pub fn new(pos: PositionKey, value: V, clock: Clock) -> Self {
        Element {
            id: clock.op_id(),
            pos,
            value,
            deleted: false,
            pos_clock: clock.clone(),
            clock,
        }
    }

    pub fn visible(&self) -> bool {
        !self.deleted
    }
}

/// A last-writer-wins slot in a register map, replaced only when an
/// incoming clock strictly dominates the stored one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field<V> {
    pub value: V,
    pub clock: Clock,
}
