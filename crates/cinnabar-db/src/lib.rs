//! # cinnabar-db
//!
//! The container layer of the Cinnabar CRDT engine.
//!
//! This crate provides the two convergent containers a host application
//! edits directly:
//! - [`Sequence`]: an ordered, mutable list with tombstones and dense
//!   position keys (insert / remove / move / update by visible index)
//! - [`LwwMap`]: a flat map of last-writer-wins register fields
//!
//! Each container instance is independently editable by one actor;
//! replicas converge by exchanging operation batches through
//! `export_operations` / `apply_remote` (or their byte-level counterparts
//! in [`codec`]), with replay and out-of-order delivery tolerated by
//! construction. Snapshots capture full state for persistence and cold
//! bootstrap.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cinnabar_core::ActorId;
//! use cinnabar_db::Sequence;
//!
//! let mut tab = Sequence::new(ActorId::from("tab"));
//! let mut phone = Sequence::new(ActorId::from("phone"));
//!
//! tab.push("milk".to_string()).unwrap();
//! tab.push("bread".to_string()).unwrap();
//! phone.apply_remote(&tab.export_operations());
//!
//! phone.insert(1, "eggs".to_string()).unwrap();
//! tab.apply_remote(&phone.export_operations());
//!
//! assert_eq!(tab.to_vec(), vec!["milk", "eggs", "bread"]);
//! ```

pub mod codec;
pub mod error;
pub mod register;
pub mod sequence;

pub use error::{DbError, Result};
pub use register::LwwMap;
pub use sequence::Sequence;
