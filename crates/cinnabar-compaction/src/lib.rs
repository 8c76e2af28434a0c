//! # cinnabar-compaction
//!
//! Keeps replicated state small in both directions: operation batches are
//! compressed to a minimal equivalent set before transmission, and
//! snapshots shed their tombstones once every peer is known to have
//! converged past them. Also home to the snapshot data types and their
//! byte codec, which the container layer builds on.

pub mod compress;
pub mod gc;
pub mod snapshot;
pub mod version_vector;

pub use compress::compress;
pub use gc::{gc_sequence_snapshot, Compactor};
pub use snapshot::{MapSnapshot, SequenceSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use version_vector::VersionVector;
