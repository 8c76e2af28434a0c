//! Replicated operations: the unit of exchange between peers.
//!
//! An operation's identity is the `(actor, lamport)` pair of its clock —
//! globally unique, never reused, and the key under which replay is
//! deduplicated. Re-delivery and out-of-order delivery of operations must
//! never corrupt state; the containers' merge rules depend only on the
//! data carried here plus the clock total order.

use crate::clock::{Clock, OpId};
use crate::element::ElementId;
use crate::position::PositionKey;
use serde::{Deserialize, Serialize};

/// A single replicated change to a sequence or register map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Operation<V> {
    /// Create a new element; `target` equals the id minted from `clock`.
    Insert {
        target: ElementId,
        pos: PositionKey,
        value: V,
        clock: Clock,
    },
    /// Tombstone an element. Applies unconditionally when the target is
    /// known; idempotent.
    Remove { target: ElementId, clock: Clock },
    /// Re-position an element without changing its identity. Last writer
    /// wins against the element's current clock.
    Move {
        target: ElementId,
        pos: PositionKey,
        clock: Clock,
    },
    /// Replace an element's value. Last writer wins against the element's
    /// current clock.
    Update {
        target: ElementId,
        value: V,
        clock: Clock,
    },
    /// Write a register-map field. Last writer wins against the field's
    /// stored clock.
    FieldSet { key: String, value: V, clock: Clock },
}

impl<V> Operation<V> {
    pub fn clock(&self) -> &Clock {
        match self {
            Operation::Insert { clock, .. }
            | Operation::Remove { clock, .. }
            | Operation::Move { clock, .. }
            | Operation::Update { clock, .. }
            | Operation::FieldSet { clock, .. } => clock,
        }
    }

    /// The identity used for replay dedup.
    pub fn id(&self) -> OpId {
        self.clock().op_id()
    }

    pub fn lamport(&self) -> u64 {
        self.clock().lamport
    }
}
