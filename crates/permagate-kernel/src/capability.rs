//! Capability registry — the startup-time conflict ledger.
//!
//! Every pipeline unit declares the capabilities it provides during phase 1
//! of pipeline assembly (see [`crate::pipeline`]). The registry rejects a
//! second declaration of an existing name so that two middleware claiming the
//! same capability is caught before the server is reachable. After assembly
//! the registry is only ever read (the reflexive capabilities endpoint
//! snapshots it per request).

use crate::error::GatewayError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Capability
// ─────────────────────────────────────────────────────────────────────────────

/// A named, versioned declaration of functionality a pipeline unit provides.
///
/// Extra fields beyond `name` and `version` are carried verbatim and appear
/// in the capabilities-listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Unique capability name (must not be empty).
    pub name: String,
    /// Capability version string, e.g. `1.0.0`.
    pub version: String,
    /// Arbitrary additional declaration fields.
    #[serde(flatten, default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Capability {
    /// Construct a minimal capability declaration.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            extra: HashMap::new(),
        }
    }

    /// Builder: attach an extra declaration field.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CapabilityRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide capability ledger.
///
/// The registry is a cheap cloneable handle; all clones share one entry list.
/// Writes happen only during sequential pipeline assembly, reads happen while
/// serving — the lock formalizes that split rather than guarding real
/// contention.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    entries: Arc<RwLock<Vec<Capability>>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability declaration.
    ///
    /// Returns [`GatewayError::DuplicateCapability`] when a capability with
    /// the same name already exists; the existing entry is left untouched.
    pub fn register(&self, capability: Capability) -> Result<(), GatewayError> {
        if capability.name.trim().is_empty() {
            return Err(GatewayError::EmptyCapabilityName);
        }
        let mut entries = self.entries.write();
        if entries.iter().any(|c| c.name == capability.name) {
            return Err(GatewayError::DuplicateCapability(capability.name));
        }
        entries.push(capability);
        Ok(())
    }

    /// Snapshot of all registered capabilities, in registration order.
    pub fn snapshot(&self) -> Vec<Capability> {
        self.entries.read().clone()
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// `true` when no capability has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_snapshot_preserves_order() {
        let registry = CapabilityRegistry::new();
        registry.register(Capability::new("sandbox", "1.0.0")).unwrap();
        registry.register(Capability::new("ArNs", "1.0.0")).unwrap();

        let caps = registry.snapshot();
        assert_eq!(caps.len(), 2);
        assert_eq!(caps[0].name, "sandbox");
        assert_eq!(caps[1].name, "ArNs");
    }

    #[test]
    fn duplicate_name_fails_and_does_not_overwrite() {
        let registry = CapabilityRegistry::new();
        registry.register(Capability::new("sandbox", "1.0.0")).unwrap();

        let err = registry
            .register(Capability::new("sandbox", "2.0.0"))
            .unwrap_err();
        assert_eq!(err, GatewayError::DuplicateCapability("sandbox".to_string()));

        // First registration survives.
        let caps = registry.snapshot();
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].version, "1.0.0");
    }

    #[test]
    fn empty_name_is_rejected() {
        let registry = CapabilityRegistry::new();
        assert_eq!(
            registry.register(Capability::new("  ", "1.0.0")),
            Err(GatewayError::EmptyCapabilityName)
        );
    }

    #[test]
    fn clones_share_the_same_ledger() {
        let registry = CapabilityRegistry::new();
        let handle = registry.clone();
        registry.register(Capability::new("reflexive", "1.0.0")).unwrap();
        assert_eq!(handle.len(), 1);
        assert!(handle.register(Capability::new("reflexive", "1.0.0")).is_err());
    }

    #[test]
    fn extra_fields_are_serialized_flat() {
        let cap = Capability::new("arweave-id-lookup", "1.0.0")
            .with_extra("manifests", serde_json::json!(true));
        let value = serde_json::to_value(&cap).unwrap();
        assert_eq!(value["name"], "arweave-id-lookup");
        assert_eq!(value["manifests"], true);
    }
}
