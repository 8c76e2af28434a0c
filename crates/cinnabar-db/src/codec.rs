//! Byte-level host contract.
//!
//! The host owns transport and persistence; the containers hand it opaque
//! byte blobs. Operations are encoded with the same generic structured
//! serialization used for snapshot payloads; nothing in the merge rules
//! depends on the encoding.

use crate::error::Result;
use crate::register::LwwMap;
use crate::sequence::Sequence;
use cinnabar_core::Operation;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode an operation batch for transmission.
pub fn encode_operations<V: Serialize>(ops: &[Operation<V>]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(ops)?)
}

/// Decode a received operation batch.
pub fn decode_operations<V: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<Operation<V>>> {
    Ok(serde_json::from_slice(bytes)?)
}

impl<V: Clone + PartialEq + Serialize + DeserializeOwned> Sequence<V> {
    /// Drain and encode pending operations in one step.
    pub fn export_bytes(&mut self) -> Result<Vec<u8>> {
        let ops = self.export_operations();
        encode_operations(&ops)
    }

    /// Decode and merge a received batch, returning how many operations
    /// actually applied — the host's cue for persisting a fresh snapshot.
    pub fn apply_remote_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let ops: Vec<Operation<V>> = decode_operations(bytes)?;
        Ok(self.apply_remote(&ops).len())
    }
}

impl<V: Clone + PartialEq + Serialize + DeserializeOwned> LwwMap<V> {
    /// Drain and encode pending operations in one step.
    pub fn export_bytes(&mut self) -> Result<Vec<u8>> {
        let ops = self.export_operations();
        encode_operations(&ops)
    }

    /// Decode and merge a received batch, returning how many operations
    /// actually applied.
    pub fn apply_remote_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let ops: Vec<Operation<V>> = decode_operations(bytes)?;
        Ok(self.apply_remote(&ops).len())
    }
}
