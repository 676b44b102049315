//! Security services: key pairs and security groups.

use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::ComputeBackend;
use crate::error::{CloudError, OrAbsent, check_limit};
use crate::paging::PagedResults;
use crate::resources::{Identified, KeyPair, SecurityGroup};

/// Security namespace of a provider.
#[derive(Clone, Debug)]
pub struct SecurityService {
    key_pairs: KeyPairService,
    security_groups: SecurityGroupService,
}

impl SecurityService {
    pub(crate) fn new(compute: Arc<dyn ComputeBackend>) -> Self {
        Self {
            key_pairs: KeyPairService {
                compute: Arc::clone(&compute),
            },
            security_groups: SecurityGroupService { compute },
        }
    }

    /// Key pair operations.
    #[must_use]
    pub const fn key_pairs(&self) -> &KeyPairService {
        &self.key_pairs
    }

    /// Security group operations.
    #[must_use]
    pub const fn security_groups(&self) -> &SecurityGroupService {
        &self.security_groups
    }
}

/// Key pair operations. Key pairs are addressed by name.
#[derive(Clone)]
pub struct KeyPairService {
    compute: Arc<dyn ComputeBackend>,
}

impl KeyPairService {
    /// Returns the key pair named `name`, or `None`. Material is never
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] for any failure other than not-found.
    pub async fn get(&self, name: &str) -> Result<Option<KeyPair>, CloudError> {
        let raw = self.compute.get_keypair(name).await.or_absent()?;
        Ok(raw.map(|raw| KeyPair::listed(raw, Arc::clone(&self.compute))))
    }

    /// Returns the key pairs named `name` (zero or one).
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] for any failure other than not-found.
    pub async fn find(&self, name: &str) -> Result<Vec<KeyPair>, CloudError> {
        Ok(self.get(name).await?.into_iter().collect())
    }

    /// Lists key pairs; the backend returns them all and they are paged here.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<KeyPair>, CloudError> {
        let page_size = check_limit(limit)?;
        let key_pairs = self
            .compute
            .list_keypairs()
            .await?
            .into_iter()
            .map(|raw| KeyPair::listed(raw, Arc::clone(&self.compute)))
            .collect();
        Ok(PagedResults::client_paged(key_pairs, page_size, marker))
    }

    /// Creates a key pair named `name`.
    ///
    /// When a key pair with that name already exists it is returned as is,
    /// without material.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for an empty name, or the backend
    /// failure.
    pub async fn create(&self, name: &str) -> Result<KeyPair, CloudError> {
        if name.is_empty() {
            return Err(CloudError::Validation(String::from(
                "key pair name must not be empty",
            )));
        }
        if let Some(existing) = self.find(name).await?.into_iter().next() {
            debug!(key_pair = name, "key pair exists; returning it");
            return Ok(existing);
        }
        info!(key_pair = name, "creating key pair");
        let raw = self.compute.create_keypair(name).await?;
        Ok(KeyPair::created(raw, Arc::clone(&self.compute)))
    }

    /// Deletes the key pair named `name`; an absent key pair counts as
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when the backend rejects the delete.
    pub async fn delete(&self, name: &str) -> Result<bool, CloudError> {
        match self.get(name).await? {
            Some(key_pair) => key_pair.delete().await,
            None => {
                debug!(key_pair = name, "key pair already absent");
                Ok(true)
            }
        }
    }
}

impl std::fmt::Debug for KeyPairService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairService").finish_non_exhaustive()
    }
}

/// Security group operations.
#[derive(Clone)]
pub struct SecurityGroupService {
    compute: Arc<dyn ComputeBackend>,
}

impl SecurityGroupService {
    async fn all(&self) -> Result<Vec<SecurityGroup>, CloudError> {
        Ok(self
            .compute
            .list_security_groups()
            .await?
            .into_iter()
            .map(|raw| SecurityGroup::new(raw, Arc::clone(&self.compute)))
            .collect())
    }

    /// Returns the groups matching `names` or `ids`.
    ///
    /// With both filters empty every group is returned. Otherwise the
    /// filters are applied independently: a group whose name and id both
    /// match appears twice.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when listing fails.
    pub async fn get_by_filter(
        &self,
        names: &[&str],
        ids: &[&str],
    ) -> Result<Vec<SecurityGroup>, CloudError> {
        let groups = self.all().await?;
        if names.is_empty() && ids.is_empty() {
            return Ok(groups);
        }
        let mut filtered = Vec::new();
        for group in groups {
            if names.contains(&group.name()) {
                filtered.push(group.clone());
            }
            if ids.contains(&group.id()) {
                filtered.push(group);
            }
        }
        Ok(filtered)
    }

    /// Returns the group with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when listing fails.
    pub async fn get(&self, id: &str) -> Result<Option<SecurityGroup>, CloudError> {
        Ok(self.get_by_filter(&[], &[id]).await?.into_iter().next())
    }

    /// Returns every group named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when listing fails.
    pub async fn find(&self, name: &str) -> Result<Vec<SecurityGroup>, CloudError> {
        self.get_by_filter(&[name], &[]).await
    }

    /// Lists security groups; the backend returns them all and they are
    /// paged here.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<SecurityGroup>, CloudError> {
        let page_size = check_limit(limit)?;
        Ok(PagedResults::client_paged(self.all().await?, page_size, marker))
    }

    /// Creates a security group.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for an empty name, or the backend
    /// failure.
    pub async fn create(&self, name: &str, description: &str) -> Result<SecurityGroup, CloudError> {
        if name.is_empty() {
            return Err(CloudError::Validation(String::from(
                "security group name must not be empty",
            )));
        }
        info!(name, "creating security group");
        let raw = self.compute.create_security_group(name, description).await?;
        Ok(SecurityGroup::new(raw, Arc::clone(&self.compute)))
    }

    /// Deletes the group with `id` after confirming it exists; an absent
    /// group counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when listing or the delete fails.
    pub async fn delete(&self, id: &str) -> Result<bool, CloudError> {
        match self.get(id).await? {
            Some(group) => group.delete().await,
            None => {
                debug!(group_id = id, "security group already absent");
                Ok(true)
            }
        }
    }
}

impl std::fmt::Debug for SecurityGroupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityGroupService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{RawKeyPair, RawSecurityGroup};
    use crate::test_support::InMemoryCompute;
    use rstest::{fixture, rstest};

    #[fixture]
    fn backend() -> Arc<InMemoryCompute> {
        let backend = InMemoryCompute::default();
        backend.add_security_group(RawSecurityGroup {
            id: String::from("sg-9"),
            name: String::from("web"),
            ..RawSecurityGroup::default()
        });
        backend.add_security_group(RawSecurityGroup {
            id: String::from("sg-1"),
            name: String::from("default"),
            ..RawSecurityGroup::default()
        });
        Arc::new(backend)
    }

    fn service(backend: &Arc<InMemoryCompute>) -> SecurityService {
        SecurityService::new(Arc::clone(backend) as Arc<dyn ComputeBackend>)
    }

    #[rstest]
    #[tokio::test]
    async fn group_matching_both_filters_appears_twice(backend: Arc<InMemoryCompute>) {
        let groups = service(&backend)
            .security_groups()
            .get_by_filter(&["web"], &["sg-9"])
            .await
            .expect("filter");
        let ids: Vec<_> = groups.iter().map(Identified::id).collect();
        assert_eq!(ids, ["sg-9", "sg-9"]);
    }

    #[rstest]
    #[tokio::test]
    async fn no_filters_returns_everything(backend: Arc<InMemoryCompute>) {
        let groups = service(&backend)
            .security_groups()
            .get_by_filter(&[], &[])
            .await
            .expect("filter");
        assert_eq!(groups.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn group_delete_confirms_existence_first(backend: Arc<InMemoryCompute>) {
        let security = service(&backend);
        assert_eq!(security.security_groups().delete("sg-missing").await, Ok(true));
        assert!(backend.calls().iter().all(|call| !call.starts_with("delete_security_group")));
        assert_eq!(security.security_groups().delete("sg-9").await, Ok(true));
        assert!(backend.calls().contains(&String::from("delete_security_group sg-9")));
    }

    #[rstest]
    #[tokio::test]
    async fn key_pair_material_only_on_create(backend: Arc<InMemoryCompute>) {
        let key_pairs = service(&backend).key_pairs().clone();
        let created = key_pairs.create("deploy").await.expect("create");
        assert!(created.material().is_some());
        let listed = key_pairs.list(None, None).await.expect("list");
        assert!(listed.iter().all(|key_pair| key_pair.material().is_none()));
        let fetched = key_pairs.get("deploy").await.expect("get").expect("present");
        assert!(fetched.material().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn key_pair_create_returns_existing(backend: Arc<InMemoryCompute>) {
        backend.add_keypair(RawKeyPair {
            name: String::from("deploy"),
            fingerprint: String::from("aa:bb"),
            ..RawKeyPair::default()
        });
        let key_pair = service(&backend)
            .key_pairs()
            .create("deploy")
            .await
            .expect("create");
        assert_eq!(key_pair.fingerprint(), "aa:bb");
        assert!(key_pair.material().is_none());
        assert!(!backend.calls().contains(&String::from("create_keypair deploy")));
    }

    #[rstest]
    #[tokio::test]
    async fn key_pair_find_and_delete(backend: Arc<InMemoryCompute>) {
        let key_pairs = service(&backend).key_pairs().clone();
        assert!(key_pairs.find("ghost").await.expect("find").is_empty());
        key_pairs.create("deploy").await.expect("create");
        assert_eq!(key_pairs.find("deploy").await.expect("find").len(), 1);
        assert_eq!(key_pairs.delete("deploy").await, Ok(true));
        assert_eq!(key_pairs.delete("deploy").await, Ok(true));
    }
}
