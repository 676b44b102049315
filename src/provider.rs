//! Provider facade: the single entry point to every service.

use std::sync::Arc;

use tracing::debug;

use crate::backend::{BlockStorageBackend, CatalogBackend, ComputeBackend, ObjectStorageBackend};
use crate::resources::BlockContext;
use crate::services::{
    BlockStoreService, ComputeService, ObjectStoreService, RegionService, SecurityService,
};

/// Services grouped by domain.
///
/// A namespace is only present when the backend it needs was wired in; an
/// absent namespace means the provider does not offer that capability.
#[derive(Clone, Debug)]
pub struct CloudProvider {
    compute: Option<ComputeService>,
    block_store: Option<BlockStoreService>,
    object_store: Option<ObjectStoreService>,
    security: Option<SecurityService>,
}

impl CloudProvider {
    /// Starts wiring a provider from backend clients.
    #[must_use]
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::default()
    }

    /// Instances, images, instance types and regions.
    #[must_use]
    pub const fn compute(&self) -> Option<&ComputeService> {
        self.compute.as_ref()
    }

    /// Volumes and snapshots.
    #[must_use]
    pub const fn block_store(&self) -> Option<&BlockStoreService> {
        self.block_store.as_ref()
    }

    /// Buckets.
    #[must_use]
    pub const fn object_store(&self) -> Option<&ObjectStoreService> {
        self.object_store.as_ref()
    }

    /// Key pairs and security groups.
    #[must_use]
    pub const fn security(&self) -> Option<&SecurityService> {
        self.security.as_ref()
    }

    /// Reports whether the provider offers the service at `path`.
    ///
    /// `path` is a namespace (`"compute"`) or a namespace followed by a
    /// service (`"compute.regions"`, `"object_store.buckets"`). Unknown
    /// paths report `false`.
    #[must_use]
    pub fn has_service(&self, path: &str) -> bool {
        let (namespace, service) = match path.split_once('.') {
            Some((namespace, service)) => (namespace, Some(service)),
            None => (path, None),
        };
        let available = match (namespace, service) {
            ("compute", None | Some("instances" | "images" | "instance_types")) => {
                self.compute.is_some()
            }
            ("compute", Some("regions")) => self
                .compute
                .as_ref()
                .is_some_and(|compute| compute.regions().is_some()),
            ("block_store", None | Some("volumes" | "snapshots")) => self.block_store.is_some(),
            ("object_store", None | Some("buckets")) => self.object_store.is_some(),
            ("security", None | Some("key_pairs" | "security_groups")) => self.security.is_some(),
            _ => false,
        };
        debug!(path, available, "capability probe");
        available
    }
}

/// Builder collecting the backend clients a provider is wired with.
#[derive(Clone, Default)]
pub struct ProviderBuilder {
    compute: Option<Arc<dyn ComputeBackend>>,
    block_storage: Option<Arc<dyn BlockStorageBackend>>,
    object_storage: Option<Arc<dyn ObjectStorageBackend>>,
    catalog: Option<Arc<dyn CatalogBackend>>,
}

impl ProviderBuilder {
    /// Wires the compute client; enables `compute` and `security`.
    #[must_use]
    pub fn compute(mut self, backend: Arc<dyn ComputeBackend>) -> Self {
        self.compute = Some(backend);
        self
    }

    /// Wires the block-storage client; enables `block_store`.
    #[must_use]
    pub fn block_storage(mut self, backend: Arc<dyn BlockStorageBackend>) -> Self {
        self.block_storage = Some(backend);
        self
    }

    /// Wires the object-storage client; enables `object_store`.
    #[must_use]
    pub fn object_storage(mut self, backend: Arc<dyn ObjectStorageBackend>) -> Self {
        self.object_storage = Some(backend);
        self
    }

    /// Wires the identity catalog; enables `compute.regions`.
    #[must_use]
    pub fn catalog(mut self, backend: Arc<dyn CatalogBackend>) -> Self {
        self.catalog = Some(backend);
        self
    }

    /// Builds the provider.
    #[must_use]
    pub fn build(self) -> CloudProvider {
        let regions = self.catalog.map(RegionService::new);
        CloudProvider {
            compute: self
                .compute
                .clone()
                .map(|compute| ComputeService::new(compute, regions)),
            block_store: self.block_storage.map(|storage| {
                BlockStoreService::new(BlockContext {
                    storage,
                    compute: self.compute.clone(),
                })
            }),
            object_store: self.object_storage.map(ObjectStoreService::new),
            security: self.compute.map(SecurityService::new),
        }
    }
}

impl std::fmt::Debug for ProviderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBuilder")
            .field("compute", &self.compute.is_some())
            .field("block_storage", &self.block_storage.is_some())
            .field("object_storage", &self.object_storage.is_some())
            .field("catalog", &self.catalog.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryCompute, InMemoryObjectStorage, StaticCatalog};
    use rstest::rstest;

    #[rstest]
    #[case("compute", true)]
    #[case("compute.instances", true)]
    #[case("compute.regions", false)]
    #[case("security.key_pairs", true)]
    #[case("object_store", true)]
    #[case("object_store.buckets", true)]
    #[case("block_store", false)]
    #[case("block_store.volumes", false)]
    #[case("networking", false)]
    #[case("compute.bogus", false)]
    fn capability_probe_follows_wiring(#[case] path: &str, #[case] expected: bool) {
        let provider = CloudProvider::builder()
            .compute(Arc::new(InMemoryCompute::default()))
            .object_storage(Arc::new(InMemoryObjectStorage::default()))
            .build();
        assert_eq!(provider.has_service(path), expected);
    }

    #[rstest]
    fn catalog_enables_regions() {
        let provider = CloudProvider::builder()
            .compute(Arc::new(InMemoryCompute::default()))
            .catalog(Arc::new(StaticCatalog::new(Vec::new())))
            .build();
        assert!(provider.has_service("compute.regions"));
        assert!(provider.compute().and_then(ComputeService::regions).is_some());
    }

    #[rstest]
    fn empty_provider_offers_nothing() {
        let provider = CloudProvider::builder().build();
        for path in ["compute", "block_store", "object_store", "security"] {
            assert!(!provider.has_service(path), "{path}");
        }
    }
}
