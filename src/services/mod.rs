//! Per-family CRUD services.
//!
//! Each service holds the backend handles it needs, passed in by the
//! provider at construction. Services follow one shape: `get` returns
//! `Ok(None)` for a missing resource, `find` either searches or reports
//! [`crate::CloudError::Unsupported`], `list` returns a
//! [`crate::PagedResults`] page and `delete` is idempotent.

mod block_store;
mod compute;
mod object_store;
mod region;
mod security;

pub use block_store::{BlockStoreService, SnapshotService, VolumeService};
pub use compute::{ComputeService, ImageService, InstanceService, InstanceSpec, InstanceTypeService};
pub use object_store::ObjectStoreService;
pub use region::RegionService;
pub use security::{KeyPairService, SecurityGroupService, SecurityService};
