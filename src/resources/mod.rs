//! Vendor-neutral resource wrappers.
//!
//! Every wrapper owns the raw backend record it was built from plus, where
//! the resource supports further operations, a handle to the backend that
//! produced it. Accessors derive their values from the raw record on every
//! call; nothing is cached and nothing is written back.

mod block_store;
mod compute;
mod object_store;
mod refs;
mod region;
mod security;

pub use block_store::{Snapshot, SnapshotState, Volume, VolumeState};
pub use compute::{Instance, InstanceState, InstanceType, MachineImage, MachineImageState};
pub use object_store::{Bucket, BucketObject, BucketObjects};
pub use refs::{
    ImageRef, InstanceRef, InstanceTypeRef, KeyPairRef, SecurityGroupRef, SnapshotRef, VolumeRef,
    ZoneRef,
};
pub use region::{PlacementZone, Region};
pub use security::{KeyPair, SecurityGroup, SecurityGroupRule};

pub(crate) use block_store::BlockContext;

/// Exposes the identity a resource is addressed by.
///
/// Server-side paging markers and identity resolution both rely on this
/// value, so it must be stable for the lifetime of the remote resource.
pub trait Identified {
    /// Returns the resource identifier (a name for key pairs and buckets).
    fn id(&self) -> &str;
}
