//! Per-container operation log.
//!
//! The log plays two roles, both process-local to one container instance:
//! it buffers locally produced operations until the host exports them for
//! transmission, and it remembers every operation identity already
//! absorbed so a replayed or duplicated batch is applied exactly once.
//!
//! The log lives and dies with its container. A container restored from a
//! snapshot starts with an empty unsent buffer and an applied set seeded
//! from the clocks the snapshot carries (see [`OperationLog::seeded`]).

use cinnabar_core::{OpId, Operation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::mem;

/// Outbound buffer plus replay-dedup set for one container.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperationLog<V> {
    /// Locally produced operations not yet exported.
    unsent: Vec<Operation<V>>,
    /// Identities of every operation already folded into container state,
    /// local ones included — an echo of our own batch must not replay.
    applied: HashSet<OpId>,
}

impl<V> OperationLog<V> {
    pub fn new() -> Self {
        Self {
            unsent: Vec::new(),
            applied: HashSet::new(),
        }
    }

    /// Rebuild the dedup set from identities recovered out of a snapshot's
    /// clocks. The unsent buffer starts empty: anything the old process
    /// had not exported is gone with it.
    pub fn seeded(ids: impl IntoIterator<Item = OpId>) -> Self {
        Self {
            unsent: Vec::new(),
            applied: ids.into_iter().collect(),
        }
    }

    /// Record a locally produced operation: buffer it for export and mark
    /// its identity applied.
    pub fn record(&mut self, op: Operation<V>) {
        self.applied.insert(op.id());
        self.unsent.push(op);
    }

    /// Test-and-set a remote operation's identity. Returns `false` when
    /// the operation was already absorbed and must be skipped.
    pub fn remember(&mut self, id: OpId) -> bool {
        self.applied.insert(id)
    }

    pub fn is_applied(&self, id: &OpId) -> bool {
        self.applied.contains(id)
    }

    /// Drain the unsent buffer. One-shot: a second call without new local
    /// mutations returns an empty batch.
    pub fn drain(&mut self) -> Vec<Operation<V>> {
        mem::take(&mut self.unsent)
    }

    /// Number of buffered, not-yet-exported operations.
    pub fn pending(&self) -> usize {
        self.unsent.len()
    }

    /// Number of operation identities known to the dedup set.
    pub fn seen(&self) -> usize {
        self.applied.len()
    }
}

impl<V> Default for OperationLog<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinnabar_core::{ActorId, LogicalClock, OpId};

    fn remove_op(clock: &mut LogicalClock) -> Operation<String> {
        Operation::Remove {
            target: OpId::new("someone", 1),
            clock: clock.tick(),
        }
    }

    #[test]
    fn test_drain_is_one_shot() {
        let mut clock = LogicalClock::new(ActorId::from("a"));
        let mut log = OperationLog::new();

        log.record(remove_op(&mut clock));
        log.record(remove_op(&mut clock));

        assert_eq!(log.pending(), 2);
        assert_eq!(log.drain().len(), 2);
        assert_eq!(log.drain().len(), 0);
        assert_eq!(log.pending(), 0);
    }

    #[test]
    fn test_remember_deduplicates() {
        let mut log: OperationLog<String> = OperationLog::new();
        let id = OpId::new("b", 7);

        assert!(log.remember(id.clone()));
        assert!(!log.remember(id.clone()));
        assert!(log.is_applied(&id));
    }

    #[test]
    fn test_local_ops_count_as_applied() {
        let mut clock = LogicalClock::new(ActorId::from("a"));
        let mut log = OperationLog::new();

        let op = remove_op(&mut clock);
        let id = op.id();
        log.record(op);

        // An echo of our own operation must not register as new.
        assert!(!log.remember(id));
    }

    #[test]
    fn test_seeded_log_knows_prior_ids_and_buffers_nothing() {
        let ids = vec![OpId::new("a", 1), OpId::new("b", 4)];
        let log: OperationLog<String> = OperationLog::seeded(ids.clone());

        assert_eq!(log.pending(), 0);
        for id in &ids {
            assert!(log.is_applied(id));
        }
        assert!(!log.is_applied(&OpId::new("a", 2)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// However a stream of identities repeats, each one registers
            /// as new exactly once.
            #[test]
            fn remember_admits_each_identity_once(
                stream in prop::collection::vec(("[a-c]", 1u64..20), 1..100)
            ) {
                let mut log: OperationLog<String> = OperationLog::new();
                let mut fresh = 0usize;
                let mut unique = std::collections::HashSet::new();

                for (actor, lamport) in stream {
                    let id = OpId::new(actor.as_str(), lamport);
                    if log.remember(id.clone()) {
                        fresh += 1;
                    }
                    unique.insert(id);
                }

                prop_assert_eq!(fresh, unique.len());
                prop_assert_eq!(log.seen(), unique.len());
            }
        }
    }
}
