//! Data types crossing the collaborator boundary.
//!
//! These types are shared by the collaborator traits in
//! [`crate::collaborators`] and carry no runtime dependencies beyond `serde`
//! and `std`. Bodies are owned `Vec<u8>` so values can be sent across async
//! task boundaries without lifetime complications.

use crate::error::GatewayError;
use crate::id::ContentId;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Name resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of resolving an ArNS name.
///
/// `resolved_id: None` signals the name does not currently map to content;
/// `ttl` is always populated and drives the `Cache-Control` hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameResolution {
    /// Identifier the name maps to, if any.
    pub resolved_id: Option<ContentId>,
    /// Resolution time-to-live in seconds.
    pub ttl: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Contiguous data
// ─────────────────────────────────────────────────────────────────────────────

/// Indexed attributes of a piece of contiguous data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataAttributes {
    /// Content hash, when indexed. Used for hash-based blocklisting.
    pub hash: Option<String>,
    /// Data size in bytes, when known.
    pub size: Option<u64>,
    /// MIME type recorded for the data.
    pub content_type: Option<String>,
    /// Whether the identifier addresses a path manifest.
    pub is_manifest: bool,
}

/// A fully retrieved piece of contiguous data.
#[derive(Debug, Clone, PartialEq)]
pub struct ContiguousData {
    /// The raw content bytes.
    pub data: Vec<u8>,
    /// Size in bytes (equal to `data.len()`, carried for symmetry with
    /// attribute lookups).
    pub size: u64,
    /// MIME type reported by the source, if any.
    pub content_type: Option<String>,
}

impl ContiguousData {
    /// Construct from raw bytes and an optional MIME type.
    pub fn new(data: Vec<u8>, content_type: Option<String>) -> Self {
        let size = data.len() as u64;
        Self {
            data,
            size,
            content_type,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manifest resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of resolving a sub-path through a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestResolution {
    /// Identifier of the resolved sub-resource, or `None` when the manifest
    /// has no entry for the path (and no fallback).
    pub resolved_id: Option<ContentId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocklist mutation
// ─────────────────────────────────────────────────────────────────────────────

/// A blocklist mutation forwarded to the data index.
///
/// Invariant: at least one of `id` / `hash` is present — enforced by
/// [`validate`](Self::validate), which callers run before forwarding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockDataEntry {
    /// Identifier to block, if blocking by id.
    pub id: Option<ContentId>,
    /// Content hash to block, if blocking by hash.
    pub hash: Option<String>,
    /// Free-form provenance of the block request.
    pub source: Option<String>,
    /// Operator notes.
    pub notes: Option<String>,
}

impl BlockDataEntry {
    /// Check the id-or-hash invariant.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.id.is_none() && self.hash.is_none() {
            return Err(GatewayError::BlockList(
                "block entry must carry an id or a hash".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_entry_requires_id_or_hash() {
        assert!(BlockDataEntry::default().validate().is_err());
        let by_hash = BlockDataEntry {
            hash: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(by_hash.validate().is_ok());
    }

    #[test]
    fn contiguous_data_size_tracks_len() {
        let data = ContiguousData::new(b"hello".to_vec(), Some("text/plain".to_string()));
        assert_eq!(data.size, 5);
    }
}
