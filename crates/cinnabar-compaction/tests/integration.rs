//! End-to-end compaction flows over hand-built state: compress a batch,
//! snapshot, collect, and gate — without a live container in the loop.

use cinnabar_compaction::{
    compress, gc_sequence_snapshot, Compactor, SequenceSnapshot, SnapshotError, VersionVector,
    SNAPSHOT_VERSION,
};
use cinnabar_core::{ActorId, Clock, Element, Operation, PositionKey};

fn clock_for(actor: &str, lamport: u64) -> Clock {
    Clock {
        lamport,
        timestamp: 0,
        actor: ActorId::from(actor),
    }
}

/// Build the op batch of one editing session: three inserts, a rename, a
/// move, and one insert+remove pair that should cancel.
fn session_ops() -> Vec<Operation<String>> {
    let writer = ActorId::from("writer");
    let first = PositionKey::between(None, None, &writer);
    let second = PositionKey::between(Some(&first), None, &writer);
    let third = PositionKey::between(Some(&second), None, &writer);
    let moved = PositionKey::between(None, Some(&first), &writer);

    let insert = |lamport: u64, pos: &PositionKey, value: &str| {
        let clock = clock_for("writer", lamport);
        Operation::Insert {
            target: clock.op_id(),
            pos: pos.clone(),
            value: value.to_string(),
            clock,
        }
    };

    let a = insert(1, &first, "water plants");
    let b = insert(2, &second, "file taxes");
    let doomed = insert(3, &third, "typo");
    let doomed_id = doomed.id();
    let a_id = a.id();
    let b_id = b.id();

    vec![
        a,
        b,
        doomed,
        Operation::Remove {
            target: doomed_id,
            clock: clock_for("writer", 4),
        },
        Operation::Update {
            target: a_id,
            value: "water the plants".to_string(),
            clock: clock_for("writer", 5),
        },
        Operation::Move {
            target: b_id,
            pos: moved,
            clock: clock_for("writer", 6),
        },
    ]
}

#[test]
fn test_compress_then_snapshot_then_gc() {
    let compressed = compress(&session_ops());

    // Two folded inserts survive; the cancelled pair is gone.
    assert_eq!(compressed.len(), 2);
    let elements: Vec<Element<String>> = compressed
        .iter()
        .map(|op| match op {
            Operation::Insert {
                pos, value, clock, ..
            } => Element::new(pos.clone(), value.clone(), clock.clone()),
            other => panic!("expected only inserts after folding, got {other:?}"),
        })
        .collect();
    assert!(elements.iter().any(|e| e.value == "water the plants"));

    // Snapshot the replayed state, tombstone one element, then collect.
    let mut snapshot = SequenceSnapshot::new(ActorId::from("writer"), 6, elements);
    snapshot.elements[0].deleted = true;

    let collected = gc_sequence_snapshot(&snapshot);
    assert_eq!(collected.elements.len(), 1);
    assert_eq!(collected.lamport, snapshot.lamport);
}

#[test]
fn test_snapshot_bytes_survive_gc() {
    let compressed = compress(&session_ops());
    let elements: Vec<Element<String>> = compressed
        .iter()
        .filter_map(|op| match op {
            Operation::Insert {
                pos, value, clock, ..
            } => Some(Element::new(pos.clone(), value.clone(), clock.clone())),
            _ => None,
        })
        .collect();

    let snapshot = SequenceSnapshot::new(ActorId::from("writer"), 6, elements);
    let bytes = gc_sequence_snapshot(&snapshot).to_bytes().unwrap();
    let back: SequenceSnapshot<String> = SequenceSnapshot::from_bytes(&bytes).unwrap();

    assert_eq!(back.version, SNAPSHOT_VERSION);
    assert_eq!(back.elements.len(), 2);
    assert!(matches!(
        SequenceSnapshot::<String>::from_bytes(b"[]"),
        Err(SnapshotError::Serialization(_))
    ));
}

#[test]
fn test_gate_tracks_mixed_actor_history() {
    // A snapshot whose elements were written by two actors.
    let mut ours = Element::new(
        PositionKey::between(None, None, &ActorId::from("writer")),
        "task".to_string(),
        clock_for("writer", 2),
    );
    ours.clock = clock_for("editor", 7);

    let snapshot = SequenceSnapshot::new(ActorId::from("writer"), 4, vec![ours]);
    let frontier = snapshot.version_vector();
    assert_eq!(frontier.get(&ActorId::from("writer")), 4);
    assert_eq!(frontier.get(&ActorId::from("editor")), 7);

    let mut compactor = Compactor::new();
    compactor.register_peer(ActorId::from("phone"));

    // The peer must have absorbed both actors' histories.
    let mut partial = VersionVector::new();
    partial.record(ActorId::from("writer"), 9);
    compactor.update_peer(ActorId::from("phone"), &partial);
    assert!(!compactor.is_stable(&frontier));

    let mut complete = partial.clone();
    complete.record(ActorId::from("editor"), 7);
    compactor.update_peer(ActorId::from("phone"), &complete);
    assert!(compactor.is_stable(&frontier));
}
