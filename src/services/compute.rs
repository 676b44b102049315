//! Compute services: instances, images, instance types and regions.

use std::sync::Arc;

use tracing::{debug, info};

use super::region::RegionService;
use crate::backend::{ComputeBackend, ListQuery, RawServer, ServerCreate};
use crate::error::{CloudError, OrAbsent, check_limit};
use crate::launch::{LaunchConfig, block_device_mappings, network_interfaces};
use crate::paging::{PagedResults, fetch_all};
use crate::resources::{
    Identified, ImageRef, Instance, InstanceType, InstanceTypeRef, KeyPairRef, MachineImage,
    SecurityGroupRef, ZoneRef,
};

/// Compute namespace of a provider.
#[derive(Clone, Debug)]
pub struct ComputeService {
    instances: InstanceService,
    images: ImageService,
    instance_types: InstanceTypeService,
    regions: Option<RegionService>,
}

impl ComputeService {
    pub(crate) fn new(compute: Arc<dyn ComputeBackend>, regions: Option<RegionService>) -> Self {
        let instance_types = InstanceTypeService {
            compute: Arc::clone(&compute),
        };
        Self {
            instances: InstanceService {
                compute: Arc::clone(&compute),
                instance_types: instance_types.clone(),
            },
            images: ImageService { compute },
            instance_types,
            regions,
        }
    }

    /// Instance operations.
    #[must_use]
    pub const fn instances(&self) -> &InstanceService {
        &self.instances
    }

    /// Machine image operations.
    #[must_use]
    pub const fn images(&self) -> &ImageService {
        &self.images
    }

    /// Instance type catalog.
    #[must_use]
    pub const fn instance_types(&self) -> &InstanceTypeService {
        &self.instance_types
    }

    /// Region listing; `None` when no identity catalog is wired.
    #[must_use]
    pub const fn regions(&self) -> Option<&RegionService> {
        self.regions.as_ref()
    }
}

/// Parameters for launching an instance.
///
/// The image and instance type are required; everything else is optional.
#[derive(Clone, Debug)]
pub struct InstanceSpec<'a> {
    name: &'a str,
    image: ImageRef<'a>,
    instance_type: InstanceTypeRef<'a>,
    zone: Option<ZoneRef<'a>>,
    key_pair: Option<KeyPairRef<'a>>,
    security_groups: Vec<SecurityGroupRef<'a>>,
    user_data: Option<&'a str>,
    launch_config: Option<&'a LaunchConfig>,
}

impl<'a> InstanceSpec<'a> {
    /// Starts a launch request.
    #[must_use]
    pub fn new(
        name: &'a str,
        image: impl Into<ImageRef<'a>>,
        instance_type: impl Into<InstanceTypeRef<'a>>,
    ) -> Self {
        Self {
            name,
            image: image.into(),
            instance_type: instance_type.into(),
            zone: None,
            key_pair: None,
            security_groups: Vec::new(),
            user_data: None,
            launch_config: None,
        }
    }

    /// Places the instance in a zone.
    #[must_use]
    pub fn zone(mut self, zone: impl Into<ZoneRef<'a>>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Injects a key pair at boot.
    #[must_use]
    pub fn key_pair(mut self, key_pair: impl Into<KeyPairRef<'a>>) -> Self {
        self.key_pair = Some(key_pair.into());
        self
    }

    /// Applies security groups.
    #[must_use]
    pub fn security_groups(mut self, groups: Vec<SecurityGroupRef<'a>>) -> Self {
        self.security_groups = groups;
        self
    }

    /// Passes user data (for example a cloud-init document).
    #[must_use]
    pub const fn user_data(mut self, user_data: &'a str) -> Self {
        self.user_data = Some(user_data);
        self
    }

    /// Requests block devices and network interfaces.
    #[must_use]
    pub const fn launch_config(mut self, launch_config: &'a LaunchConfig) -> Self {
        self.launch_config = Some(launch_config);
        self
    }
}

/// Instance operations.
#[derive(Clone)]
pub struct InstanceService {
    compute: Arc<dyn ComputeBackend>,
    instance_types: InstanceTypeService,
}

impl InstanceService {
    fn wrap(&self, raw: RawServer) -> Instance {
        Instance::new(raw, Arc::clone(&self.compute))
    }

    /// Returns the instance with `id`, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] for any backend failure other than
    /// not-found.
    pub async fn get(&self, id: &str) -> Result<Option<Instance>, CloudError> {
        let raw = self.compute.get_server(id).await.or_absent()?;
        Ok(raw.map(|raw| self.wrap(raw)))
    }

    /// Instance search is not offered by this provider.
    ///
    /// # Errors
    ///
    /// Always returns [`CloudError::Unsupported`].
    #[expect(clippy::unused_async, reason = "keeps find awaitable like the other operations")]
    pub async fn find(&self, _name: &str) -> Result<Vec<Instance>, CloudError> {
        Err(CloudError::unsupported("find_instance"))
    }

    /// Lists instances one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<Instance>, CloudError> {
        let page_size = check_limit(limit)?;
        let query = ListQuery::new(page_size.map(|size| size.saturating_add(1)), marker);
        let servers = self.compute.list_servers(query).await?;
        let instances = servers.into_iter().map(|raw| self.wrap(raw)).collect();
        Ok(PagedResults::server_paged(instances, page_size))
    }

    /// Returns an empty launch configuration for use with [`InstanceSpec`].
    #[must_use]
    pub fn create_launch_config(&self) -> LaunchConfig {
        LaunchConfig::new()
    }

    /// Launches an instance.
    ///
    /// A bare instance type is resolved by name first and by id second.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::InstanceTypeNotFound`] when the instance type
    /// cannot be resolved, or the backend failure.
    pub async fn create(&self, spec: InstanceSpec<'_>) -> Result<Instance, CloudError> {
        let flavor_id = self.instance_types.resolve(spec.instance_type).await?;
        let (block_devices, networks) = spec
            .launch_config
            .map(|config| (block_device_mappings(config), network_interfaces(config)))
            .unwrap_or_default();
        let request = ServerCreate {
            name: spec.name.to_owned(),
            image_id: spec.image.as_identifier().to_owned(),
            flavor_id,
            availability_zone: spec.zone.map(|zone| zone.as_identifier().to_owned()),
            key_name: spec
                .key_pair
                .map(|key_pair| key_pair.as_identifier().to_owned()),
            security_groups: spec
                .security_groups
                .iter()
                .map(|group| group.as_identifier().to_owned())
                .collect(),
            user_data: spec.user_data.map(str::to_owned),
            block_devices,
            networks,
        };
        info!(
            name = %request.name,
            image_id = %request.image_id,
            flavor_id = %request.flavor_id,
            "creating instance"
        );
        let raw = self.compute.create_server(&request).await?;
        Ok(self.wrap(raw))
    }

    /// Deletes the instance with `id`; an absent instance counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when the backend rejects the delete.
    pub async fn delete(&self, id: &str) -> Result<bool, CloudError> {
        match self.get(id).await? {
            Some(instance) => instance.delete().await,
            None => {
                debug!(instance_id = id, "instance already absent");
                Ok(true)
            }
        }
    }
}

impl std::fmt::Debug for InstanceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceService").finish_non_exhaustive()
    }
}

/// Machine image operations.
#[derive(Clone)]
pub struct ImageService {
    compute: Arc<dyn ComputeBackend>,
}

impl ImageService {
    /// Returns the image with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] for any failure other than not-found.
    pub async fn get(&self, id: &str) -> Result<Option<MachineImage>, CloudError> {
        let raw = self.compute.get_image(id).await.or_absent()?;
        Ok(raw.map(|raw| MachineImage::new(raw, Arc::clone(&self.compute))))
    }

    /// Image search is not offered by this provider.
    ///
    /// # Errors
    ///
    /// Always returns [`CloudError::Unsupported`].
    #[expect(clippy::unused_async, reason = "keeps find awaitable like the other operations")]
    pub async fn find(&self, _name: &str) -> Result<Vec<MachineImage>, CloudError> {
        Err(CloudError::unsupported("find_image"))
    }

    /// Lists images one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<MachineImage>, CloudError> {
        let page_size = check_limit(limit)?;
        let query = ListQuery::new(page_size.map(|size| size.saturating_add(1)), marker);
        let images = self
            .compute
            .list_images(query)
            .await?
            .into_iter()
            .map(|raw| MachineImage::new(raw, Arc::clone(&self.compute)))
            .collect();
        Ok(PagedResults::server_paged(images, page_size))
    }

    /// Deletes the image with `id`; an absent image counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when the backend rejects the delete.
    pub async fn delete(&self, id: &str) -> Result<bool, CloudError> {
        match self.get(id).await? {
            Some(image) => image.delete().await,
            None => {
                debug!(image_id = id, "image already absent");
                Ok(true)
            }
        }
    }
}

impl std::fmt::Debug for ImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageService").finish_non_exhaustive()
    }
}

/// Page size used when scanning the whole flavour catalog.
const FLAVOR_SCAN_PAGE_SIZE: usize = 100;

/// Instance type catalog.
#[derive(Clone)]
pub struct InstanceTypeService {
    compute: Arc<dyn ComputeBackend>,
}

impl InstanceTypeService {
    /// Returns the instance type with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] for any failure other than not-found.
    pub async fn get(&self, id: &str) -> Result<Option<InstanceType>, CloudError> {
        let raw = self.compute.get_flavor(id).await.or_absent()?;
        Ok(raw.map(InstanceType::new))
    }

    /// Returns every instance type named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when listing fails.
    pub async fn find(&self, name: &str) -> Result<Vec<InstanceType>, CloudError> {
        let flavors = fetch_all(|marker| async move {
            self.list(Some(FLAVOR_SCAN_PAGE_SIZE), marker.as_deref()).await
        })
        .await?;
        Ok(flavors
            .into_iter()
            .filter(|flavor| flavor.name() == name)
            .collect())
    }

    /// Lists instance types one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<InstanceType>, CloudError> {
        let page_size = check_limit(limit)?;
        let query = ListQuery::new(page_size.map(|size| size.saturating_add(1)), marker);
        let flavors = self
            .compute
            .list_flavors(query)
            .await?
            .into_iter()
            .map(InstanceType::new)
            .collect();
        Ok(PagedResults::server_paged(flavors, page_size))
    }

    /// Resolves an instance type argument to the identifier the backend
    /// expects.
    pub(crate) async fn resolve(
        &self,
        instance_type: InstanceTypeRef<'_>,
    ) -> Result<String, CloudError> {
        let name = match instance_type {
            InstanceTypeRef::InstanceType(_) => {
                return Ok(instance_type.as_identifier().to_owned());
            }
            InstanceTypeRef::Name(name) => name,
        };
        if let Some(found) = self.find(name).await?.into_iter().next() {
            return Ok(found.id().to_owned());
        }
        debug!(name, "no instance type with that name; trying it as an id");
        match self.get(name).await? {
            Some(found) => Ok(found.id().to_owned()),
            None => Err(CloudError::InstanceTypeNotFound {
                name: name.to_owned(),
            }),
        }
    }
}

impl std::fmt::Debug for InstanceTypeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceTypeService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ComputeError, RawFlavor, RawImage};
    use crate::launch::DeviceSource;
    use crate::test_support::InMemoryCompute;
    use rstest::{fixture, rstest};

    #[fixture]
    fn backend() -> Arc<InMemoryCompute> {
        let backend = InMemoryCompute::default();
        backend.add_flavor(RawFlavor {
            id: String::from("2"),
            name: String::from("m1.small"),
            vcpus: 1,
            ram: 2048,
            disk: 20,
            ..RawFlavor::default()
        });
        backend.add_image(RawImage {
            id: String::from("img-1"),
            name: String::from("ubuntu"),
            status: String::from("ACTIVE"),
            ..RawImage::default()
        });
        Arc::new(backend)
    }

    fn service(backend: &Arc<InMemoryCompute>) -> ComputeService {
        ComputeService::new(Arc::clone(backend) as Arc<dyn ComputeBackend>, None)
    }

    #[rstest]
    #[tokio::test]
    async fn flavour_beyond_the_default_page_resolves_by_name(backend: Arc<InMemoryCompute>) {
        backend.set_default_page_size(1);
        for index in 3..=FLAVOR_SCAN_PAGE_SIZE + 5 {
            backend.add_flavor(RawFlavor {
                id: index.to_string(),
                name: format!("gen.{index}"),
                ..RawFlavor::default()
            });
        }
        let last = format!("gen.{}", FLAVOR_SCAN_PAGE_SIZE + 5);

        let found = service(&backend)
            .instance_types()
            .find(&last)
            .await
            .expect("find");
        let ids: Vec<_> = found.iter().map(Identified::id).collect();
        assert_eq!(ids, [(FLAVOR_SCAN_PAGE_SIZE + 5).to_string()]);

        service(&backend)
            .instances()
            .create(InstanceSpec::new("late", "img-1", last.as_str()))
            .await
            .expect("create with late flavour");
        let request = backend.last_server_create().expect("request recorded");
        assert_eq!(request.flavor_id, (FLAVOR_SCAN_PAGE_SIZE + 5).to_string());
    }

    #[rstest]
    #[tokio::test]
    async fn create_resolves_instance_type_name(backend: Arc<InMemoryCompute>) {
        let compute = service(&backend);
        let instance = compute
            .instances()
            .create(InstanceSpec::new("web-1", "img-1", "m1.small").zone("nova"))
            .await
            .expect("create");
        let request = backend.last_server_create().expect("request recorded");
        assert_eq!(request.flavor_id, "2");
        assert_eq!(request.availability_zone.as_deref(), Some("nova"));
        let fetched = compute
            .instances()
            .get(instance.id())
            .await
            .expect("get")
            .expect("present");
        assert_eq!(fetched.id(), instance.id());
    }

    #[rstest]
    #[tokio::test]
    async fn bare_instance_type_falls_back_to_id(backend: Arc<InMemoryCompute>) {
        let compute = service(&backend);
        compute
            .instances()
            .create(InstanceSpec::new("web-1", "img-1", "2"))
            .await
            .expect("create");
        assert_eq!(
            backend.last_server_create().map(|request| request.flavor_id),
            Some(String::from("2"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_instance_type_is_reported(backend: Arc<InMemoryCompute>) {
        let err = service(&backend)
            .instances()
            .create(InstanceSpec::new("web-1", "img-1", "m9.huge"))
            .await
            .expect_err("unknown type");
        assert_eq!(
            err,
            CloudError::InstanceTypeNotFound {
                name: String::from("m9.huge")
            }
        );
        assert!(backend.last_server_create().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn launch_config_is_translated(backend: Arc<InMemoryCompute>) {
        let compute = service(&backend);
        let mut config = compute.instances().create_launch_config();
        config
            .add_volume_device(
                Some(DeviceSource::Image(String::from("img-1"))),
                true,
                Some(30),
                Some(true),
            )
            .expect("root device");
        config.add_ephemeral_device().add_network_interface("net-1");
        compute
            .instances()
            .create(InstanceSpec::new("web-1", "img-1", "m1.small").launch_config(&config))
            .await
            .expect("create");
        let request = backend.last_server_create().expect("request recorded");
        assert_eq!(request.block_devices.len(), 2);
        assert_eq!(request.networks.len(), 1);
        assert_eq!(request.networks[0].net_id, "net-1");
    }

    #[rstest]
    #[tokio::test]
    async fn find_is_unsupported_for_images_and_instances(backend: Arc<InMemoryCompute>) {
        let compute = service(&backend);
        assert!(matches!(
            compute.images().find("ubuntu").await,
            Err(CloudError::Unsupported { .. })
        ));
        assert!(matches!(
            compute.instances().find("web").await,
            Err(CloudError::Unsupported { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn instance_delete_is_idempotent(backend: Arc<InMemoryCompute>) {
        backend.add_server(RawServer {
            id: String::from("srv-1"),
            name: String::from("web"),
            ..RawServer::default()
        });
        let compute = service(&backend);
        assert_eq!(compute.instances().delete("srv-1").await, Ok(true));
        assert_eq!(compute.instances().delete("srv-1").await, Ok(true));
        assert!(compute.instances().get("srv-1").await.expect("get").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn backend_failures_propagate(backend: Arc<InMemoryCompute>) {
        let failure = ComputeError::Provider {
            message: String::from("token expired"),
        };
        backend.fail_next(failure.clone());
        let err = service(&backend)
            .images()
            .get("img-1")
            .await
            .expect_err("failure");
        assert_eq!(err, CloudError::Compute(failure));
    }
}
