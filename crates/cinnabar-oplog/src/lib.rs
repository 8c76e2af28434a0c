//! # cinnabar-oplog
//!
//! The per-container operation log: outbound buffering of locally produced
//! operations and the applied-identity set that makes remote replay
//! idempotent. Cross-replica consistency in Cinnabar comes entirely from
//! exchanging these operation batches; the log is the bookkeeping that
//! makes re-delivery and out-of-order delivery harmless.

pub mod log;

pub use log::OperationLog;
