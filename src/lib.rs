//! Provider-agnostic cloud abstraction layer.
//!
//! A [`CloudProvider`] groups CRUD services by domain (compute, block store,
//! object store, security). Services talk to vendor clients only through the
//! traits in [`backend`] and hand back resource wrappers from [`resources`]
//! whose accessors read the raw backend records. The [`openstack`] module
//! wires those traits to the OpenStack REST APIs.

pub mod backend;
pub mod config;
pub mod error;
pub mod launch;
pub mod openstack;
pub mod paging;
pub mod provider;
pub mod resources;
pub mod services;
pub mod test_support;

pub use config::{ConfigError, OpenStackConfig};
pub use error::CloudError;
pub use launch::{BlockDeviceSpec, DeviceSource, LaunchConfig, LaunchConfigError};
pub use paging::{PagedResults, fetch_all};
pub use provider::{CloudProvider, ProviderBuilder};
pub use resources::{
    Bucket, BucketObject, Identified, Instance, InstanceState, InstanceType, KeyPair,
    MachineImage, MachineImageState, PlacementZone, Region, SecurityGroup, SecurityGroupRule,
    Snapshot, SnapshotState, Volume, VolumeState,
};
pub use services::{
    BlockStoreService, ComputeService, ImageService, InstanceService, InstanceSpec,
    InstanceTypeService, KeyPairService, ObjectStoreService, RegionService, SecurityGroupService,
    SecurityService, SnapshotService, VolumeService,
};
