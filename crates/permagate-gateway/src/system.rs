//! Collaborator wiring.
//!
//! [`System`] bundles the collaborator trait objects the pipeline units are
//! built from. Production deployments construct it around real services
//! (SQLite indexes, chain clients, caching fetchers). The `InMemory*`
//! implementations below back [`System::in_memory`], used by the binary in
//! development mode and by the integration tests.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use permagate_kernel::{
    BlockDataEntry, BlockListValidator, ContentId, ContiguousData, ContiguousDataIndex,
    ContiguousDataSource, DataAttributes, GatewayError, ManifestPathResolver, ManifestResolution,
    NameResolution, NameResolver, TransactionFetcher,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The collaborator bundle consumed by
/// [`GatewayServer`](crate::server::GatewayServer).
#[derive(Clone)]
pub struct System {
    pub name_resolver: Arc<dyn NameResolver>,
    pub data_source: Arc<dyn ContiguousDataSource>,
    pub data_index: Arc<dyn ContiguousDataIndex>,
    pub block_list_validator: Arc<dyn BlockListValidator>,
    pub manifest_path_resolver: Arc<dyn ManifestPathResolver>,
    pub tx_fetcher: Arc<dyn TransactionFetcher>,
    /// Prioritized-fetch set: appended by admin requests, drained by the
    /// (external) fetch worker.
    pub prioritized_tx_ids: Arc<DashSet<String>>,
}

impl System {
    /// A fully in-memory system. Content must be seeded through the concrete
    /// implementations before anything resolves.
    pub fn in_memory() -> Self {
        let index = Arc::new(InMemoryDataIndex::new());
        Self {
            name_resolver: Arc::new(InMemoryNameResolver::new(300)),
            data_source: Arc::new(InMemoryDataSource::new()),
            data_index: index.clone(),
            block_list_validator: index,
            manifest_path_resolver: Arc::new(InMemoryManifestPathResolver::new()),
            tx_fetcher: Arc::new(RecordingTxFetcher::new()),
            prioritized_tx_ids: Arc::new(DashSet::new()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory data index + blocklist
// ─────────────────────────────────────────────────────────────────────────────

/// DashMap-backed index. Owns both the attribute tables and the blocklist,
/// the way the production index does.
#[derive(Default)]
pub struct InMemoryDataIndex {
    attributes: DashMap<String, DataAttributes>,
    blocked_ids: DashSet<String>,
    blocked_hashes: DashSet<String>,
}

impl InMemoryDataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed indexed attributes for an identifier.
    pub fn insert_attributes(&self, id: &ContentId, attributes: DataAttributes) {
        self.attributes.insert(id.as_str().to_string(), attributes);
    }
}

#[async_trait]
impl ContiguousDataIndex for InMemoryDataIndex {
    async fn get_data_attributes(
        &self,
        id: &ContentId,
    ) -> Result<Option<DataAttributes>, GatewayError> {
        Ok(self.attributes.get(id.as_str()).map(|a| a.value().clone()))
    }

    async fn get_debug_info(&self) -> Result<serde_json::Value, GatewayError> {
        Ok(json!({
            "indexedAttributes": self.attributes.len(),
            "blockedIds": self.blocked_ids.len(),
            "blockedHashes": self.blocked_hashes.len(),
        }))
    }

    async fn block_data(&self, entry: BlockDataEntry) -> Result<(), GatewayError> {
        entry.validate()?;
        if let Some(id) = entry.id {
            self.blocked_ids.insert(String::from(id));
        }
        if let Some(hash) = entry.hash {
            self.blocked_hashes.insert(hash);
        }
        Ok(())
    }
}

#[async_trait]
impl BlockListValidator for InMemoryDataIndex {
    async fn is_id_blocked(&self, id: &ContentId) -> Result<bool, GatewayError> {
        Ok(self.blocked_ids.contains(id.as_str()))
    }

    async fn is_hash_blocked(&self, hash: &str) -> Result<bool, GatewayError> {
        Ok(self.blocked_hashes.contains(hash))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory data source
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryDataSource {
    objects: DashMap<String, ContiguousData>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed stored content for an identifier.
    pub fn insert(&self, id: &ContentId, data: Vec<u8>, content_type: Option<&str>) {
        self.objects.insert(
            id.as_str().to_string(),
            ContiguousData::new(data, content_type.map(str::to_string)),
        );
    }
}

#[async_trait]
impl ContiguousDataSource for InMemoryDataSource {
    async fn get_data(&self, id: &ContentId) -> Result<ContiguousData, GatewayError> {
        self.objects
            .get(id.as_str())
            .map(|d| d.value().clone())
            .ok_or_else(|| {
                GatewayError::DataUnavailable(id.to_string(), "not stored".to_string())
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory name resolver
// ─────────────────────────────────────────────────────────────────────────────

pub struct InMemoryNameResolver {
    names: DashMap<String, ContentId>,
    ttl: u64,
}

impl InMemoryNameResolver {
    pub fn new(ttl: u64) -> Self {
        Self {
            names: DashMap::new(),
            ttl,
        }
    }

    /// Seed a name → identifier mapping.
    pub fn insert(&self, name: &str, id: ContentId) {
        self.names.insert(name.to_string(), id);
    }
}

#[async_trait]
impl NameResolver for InMemoryNameResolver {
    async fn resolve(&self, name: &str) -> Result<NameResolution, GatewayError> {
        Ok(NameResolution {
            resolved_id: self.names.get(name).map(|id| id.value().clone()),
            ttl: self.ttl,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory manifest path resolver
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryManifestPathResolver {
    entries: DashMap<(String, String), ContentId>,
    resolutions: AtomicU64,
}

impl InMemoryManifestPathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a (manifest, path) → identifier entry. Use an empty path for the
    /// manifest index.
    pub fn insert(&self, manifest_id: &ContentId, path: &str, target: ContentId) {
        self.entries.insert(
            (manifest_id.as_str().to_string(), path.to_string()),
            target,
        );
    }

    /// Number of resolution calls observed (test instrumentation).
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ManifestPathResolver for InMemoryManifestPathResolver {
    async fn resolve_path(
        &self,
        manifest_id: &ContentId,
        path: &str,
    ) -> Result<ManifestResolution, GatewayError> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        Ok(ManifestResolution {
            resolved_id: self
                .entries
                .get(&(manifest_id.as_str().to_string(), path.to_string()))
                .map(|e| e.value().clone()),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording fetch queue
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTxFetcher {
    queued: DashSet<String>,
}

impl RecordingTxFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when the identifier was handed to the queue at least once.
    pub fn was_queued(&self, id: &str) -> bool {
        self.queued.contains(id)
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }
}

#[async_trait]
impl TransactionFetcher for RecordingTxFetcher {
    async fn queue_tx_id(&self, id: ContentId) -> Result<(), GatewayError> {
        self.queued.insert(String::from(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TX_ID: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    #[tokio::test]
    async fn block_data_mutates_both_views() {
        let index = InMemoryDataIndex::new();
        let id: ContentId = TX_ID.parse().unwrap();

        assert!(!index.is_id_blocked(&id).await.unwrap());
        index
            .block_data(BlockDataEntry {
                id: Some(id.clone()),
                hash: Some("h1".to_string()),
                source: Some("ops".to_string()),
                notes: None,
            })
            .await
            .unwrap();
        assert!(index.is_id_blocked(&id).await.unwrap());
        assert!(index.is_hash_blocked("h1").await.unwrap());
    }

    #[tokio::test]
    async fn block_data_rejects_empty_entries() {
        let index = InMemoryDataIndex::new();
        assert!(index.block_data(BlockDataEntry::default()).await.is_err());
    }

    #[tokio::test]
    async fn resolver_returns_ttl_even_when_unresolved() {
        let resolver = InMemoryNameResolver::new(300);
        let resolution = resolver.resolve("missing").await.unwrap();
        assert_eq!(resolution.resolved_id, None);
        assert_eq!(resolution.ttl, 300);
    }
}
