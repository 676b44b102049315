//! Backend client interfaces consumed by the services.
//!
//! Each capability family (compute, block storage, object storage, identity
//! catalog) is a separate object-safe trait so a provider can be wired with
//! any subset of them. Implementations are expected to be already
//! authenticated; the services never look credentials up themselves.

mod error;
mod records;

use std::future::Future;
use std::pin::Pin;

pub use error::{BlockStorageError, CatalogError, ComputeError, NotFound, ObjectStorageError};
pub use records::{
    CatalogEndpoint, CatalogService, RawAddress, RawAttachment, RawContainer, RawFlavor,
    RawImage, RawIpRange, RawKeyPair, RawLink, RawNamed, RawObject, RawSecurityGroup,
    RawSecurityGroupRule, RawServer, RawSnapshot, RawVolume, RuleCreate, ServerCreate,
    SnapshotCreate, VolumeCreate,
};

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Paging parameters forwarded to backends that page server-side.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListQuery {
    /// Maximum number of records to return.
    pub limit: Option<usize>,
    /// Identifier of the last record of the previous page.
    pub marker: Option<String>,
}

impl ListQuery {
    /// Builds a query from an optional limit and marker.
    #[must_use]
    pub fn new(limit: Option<usize>, marker: Option<&str>) -> Self {
        Self {
            limit,
            marker: marker.map(str::to_owned),
        }
    }
}

/// Listing parameters for object-storage containers and objects.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContainerQuery {
    /// Only return names starting with this prefix.
    pub prefix: Option<String>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
    /// Name of the last record of the previous page.
    pub marker: Option<String>,
}

/// Compute client: servers, flavours, images, key pairs and security groups.
pub trait ComputeBackend: Send + Sync {
    /// Lists servers, honouring the query's limit and marker.
    fn list_servers(&self, query: ListQuery) -> BackendFuture<'_, Vec<RawServer>, ComputeError>;

    /// Fetches one server by id.
    fn get_server<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawServer, ComputeError>;

    /// Boots a new server.
    fn create_server<'a>(
        &'a self,
        request: &'a ServerCreate,
    ) -> BackendFuture<'a, RawServer, ComputeError>;

    /// Deletes a server.
    fn delete_server<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), ComputeError>;

    /// Attaches a block-storage volume to a server.
    fn attach_volume<'a>(
        &'a self,
        server_id: &'a str,
        volume_id: &'a str,
        device: Option<&'a str>,
    ) -> BackendFuture<'a, (), ComputeError>;

    /// Detaches a block-storage volume from a server.
    fn detach_volume<'a>(
        &'a self,
        server_id: &'a str,
        volume_id: &'a str,
    ) -> BackendFuture<'a, (), ComputeError>;

    /// Lists flavours, honouring the query's limit and marker.
    fn list_flavors(&self, query: ListQuery) -> BackendFuture<'_, Vec<RawFlavor>, ComputeError>;

    /// Fetches one flavour by id.
    fn get_flavor<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawFlavor, ComputeError>;

    /// Lists images, honouring the query's limit and marker.
    fn list_images(&self, query: ListQuery) -> BackendFuture<'_, Vec<RawImage>, ComputeError>;

    /// Fetches one image by id.
    fn get_image<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawImage, ComputeError>;

    /// Deletes an image.
    fn delete_image<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), ComputeError>;

    /// Lists every key pair visible to the caller.
    fn list_keypairs(&self) -> BackendFuture<'_, Vec<RawKeyPair>, ComputeError>;

    /// Fetches one key pair by name.
    fn get_keypair<'a>(&'a self, name: &'a str) -> BackendFuture<'a, RawKeyPair, ComputeError>;

    /// Generates a new key pair; the response carries the private key.
    fn create_keypair<'a>(&'a self, name: &'a str)
    -> BackendFuture<'a, RawKeyPair, ComputeError>;

    /// Deletes a key pair by name.
    fn delete_keypair<'a>(&'a self, name: &'a str) -> BackendFuture<'a, (), ComputeError>;

    /// Lists every security group visible to the caller.
    fn list_security_groups(&self) -> BackendFuture<'_, Vec<RawSecurityGroup>, ComputeError>;

    /// Creates a security group.
    fn create_security_group<'a>(
        &'a self,
        name: &'a str,
        description: &'a str,
    ) -> BackendFuture<'a, RawSecurityGroup, ComputeError>;

    /// Deletes a security group by id.
    fn delete_security_group<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), ComputeError>;

    /// Adds an ingress rule to a security group.
    fn create_security_group_rule<'a>(
        &'a self,
        request: &'a RuleCreate,
    ) -> BackendFuture<'a, RawSecurityGroupRule, ComputeError>;
}

/// Block-storage client: volumes and volume snapshots.
pub trait BlockStorageBackend: Send + Sync {
    /// Lists volumes, honouring the query's limit and marker.
    fn list_volumes(&self, query: ListQuery)
    -> BackendFuture<'_, Vec<RawVolume>, BlockStorageError>;

    /// Fetches one volume by id.
    fn get_volume<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawVolume, BlockStorageError>;

    /// Creates a volume.
    fn create_volume<'a>(
        &'a self,
        request: &'a VolumeCreate,
    ) -> BackendFuture<'a, RawVolume, BlockStorageError>;

    /// Deletes a volume.
    fn delete_volume<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), BlockStorageError>;

    /// Lists snapshots, honouring the query's limit and marker.
    fn list_snapshots(
        &self,
        query: ListQuery,
    ) -> BackendFuture<'_, Vec<RawSnapshot>, BlockStorageError>;

    /// Fetches one snapshot by id.
    fn get_snapshot<'a>(
        &'a self,
        id: &'a str,
    ) -> BackendFuture<'a, RawSnapshot, BlockStorageError>;

    /// Snapshots a volume.
    fn create_snapshot<'a>(
        &'a self,
        request: &'a SnapshotCreate,
    ) -> BackendFuture<'a, RawSnapshot, BlockStorageError>;

    /// Deletes a snapshot.
    fn delete_snapshot<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), BlockStorageError>;
}

/// Object-storage client: account-level containers and their objects.
pub trait ObjectStorageBackend: Send + Sync {
    /// Lists containers of the account.
    fn list_containers(
        &self,
        query: ContainerQuery,
    ) -> BackendFuture<'_, Vec<RawContainer>, ObjectStorageError>;

    /// Creates a container; creating an existing container is not an error.
    fn create_container<'a>(&'a self, name: &'a str)
    -> BackendFuture<'a, (), ObjectStorageError>;

    /// Deletes an empty container.
    fn delete_container<'a>(&'a self, name: &'a str)
    -> BackendFuture<'a, (), ObjectStorageError>;

    /// Lists objects inside a container.
    fn list_objects<'a>(
        &'a self,
        container: &'a str,
        query: ContainerQuery,
    ) -> BackendFuture<'a, Vec<RawObject>, ObjectStorageError>;

    /// Uploads an object, replacing any previous content.
    fn put_object<'a>(
        &'a self,
        container: &'a str,
        name: &'a str,
        content: Vec<u8>,
    ) -> BackendFuture<'a, (), ObjectStorageError>;

    /// Downloads an object's content.
    fn get_object<'a>(
        &'a self,
        container: &'a str,
        name: &'a str,
    ) -> BackendFuture<'a, Vec<u8>, ObjectStorageError>;

    /// Deletes an object.
    fn delete_object<'a>(
        &'a self,
        container: &'a str,
        name: &'a str,
    ) -> BackendFuture<'a, (), ObjectStorageError>;
}

/// Identity client exposing the service catalog.
pub trait CatalogBackend: Send + Sync {
    /// Returns the catalog of services and their endpoints.
    fn service_catalog(&self) -> BackendFuture<'_, Vec<CatalogService>, CatalogError>;
}
