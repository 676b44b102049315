//! Block-storage resources: volumes and snapshots.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::{Identified, InstanceRef, PlacementZone, ZoneRef};
use crate::backend::{
    BlockStorageBackend, ComputeBackend, RawSnapshot, RawVolume, SnapshotCreate, VolumeCreate,
};
use crate::error::{CloudError, check_volume_size, idempotent_delete};

/// Backend handles shared by block-storage wrappers.
///
/// Attaching volumes goes through the compute API, so the compute handle is
/// carried when the provider has one.
#[derive(Clone)]
pub(crate) struct BlockContext {
    pub(crate) storage: Arc<dyn BlockStorageBackend>,
    pub(crate) compute: Option<Arc<dyn ComputeBackend>>,
}

impl BlockContext {
    fn compute(&self, operation: &str) -> Result<&Arc<dyn ComputeBackend>, CloudError> {
        self.compute
            .as_ref()
            .ok_or_else(|| CloudError::unsupported(operation))
    }

    pub(crate) fn volume(&self, raw: RawVolume) -> Volume {
        Volume {
            raw,
            context: self.clone(),
        }
    }

    pub(crate) fn snapshot(&self, raw: RawSnapshot) -> Snapshot {
        Snapshot {
            raw,
            context: self.clone(),
        }
    }
}

/// Normalised state of a volume.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VolumeState {
    /// Being created or restored.
    Creating,
    /// Ready and detached.
    Available,
    /// Attached to an instance.
    InUse,
    /// Being deleted.
    Deleting,
    /// Failed.
    Error,
    /// Any status this layer does not recognise.
    Unknown,
}

impl VolumeState {
    fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "creating" | "downloading" | "restoring-backup" => Self::Creating,
            "available" => Self::Available,
            "in-use" | "attaching" | "detaching" => Self::InUse,
            "deleting" => Self::Deleting,
            "error" | "error_deleting" | "error_restoring" | "error_extending" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Block-storage volume.
#[derive(Clone)]
pub struct Volume {
    raw: RawVolume,
    context: BlockContext,
}

impl Volume {
    /// Display name; empty when the volume is unnamed.
    #[must_use]
    pub fn name(&self) -> &str {
        self.raw.name.as_deref().unwrap_or_default()
    }

    /// Size in GiB.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.raw.size
    }

    /// Normalised state.
    #[must_use]
    pub fn state(&self) -> VolumeState {
        VolumeState::from_status(&self.raw.status)
    }

    /// Availability zone name.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.raw.availability_zone.as_deref()
    }

    /// Availability zone as a typed value.
    #[must_use]
    pub fn placement_zone(&self) -> Option<PlacementZone> {
        self.zone().map(|zone| PlacementZone::new(zone, None))
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.raw.description.as_deref()
    }

    /// Snapshot the volume was restored from.
    #[must_use]
    pub fn source_snapshot_id(&self) -> Option<&str> {
        self.raw.snapshot_id.as_deref()
    }

    /// Creation timestamp as reported by the provider.
    #[must_use]
    pub fn create_time(&self) -> Option<&str> {
        self.raw.created_at.as_deref()
    }

    /// Instance the volume is attached to, if any.
    #[must_use]
    pub fn attached_to(&self) -> Option<&str> {
        self.raw
            .attachments
            .first()
            .map(|attachment| attachment.server_id.as_str())
    }

    /// Attaches the volume to an instance, optionally at a given device path.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Unsupported`] when the provider has no compute
    /// backend, or the backend failure otherwise.
    pub async fn attach<'a>(
        &self,
        instance: impl Into<InstanceRef<'a>>,
        device: Option<&str>,
    ) -> Result<(), CloudError> {
        let compute = self.context.compute("attach_volume")?;
        let instance_id = instance.into().as_identifier();
        info!(volume_id = %self.raw.id, instance_id, "attaching volume");
        compute
            .attach_volume(instance_id, &self.raw.id, device)
            .await?;
        Ok(())
    }

    /// Detaches the volume from the instance it is attached to.
    ///
    /// Detaching a volume that is not attached is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Unsupported`] when the provider has no compute
    /// backend, or the backend failure otherwise.
    pub async fn detach(&self) -> Result<(), CloudError> {
        let Some(instance_id) = self.attached_to() else {
            return Ok(());
        };
        let compute = self.context.compute("detach_volume")?;
        info!(volume_id = %self.raw.id, instance_id, "detaching volume");
        compute.detach_volume(instance_id, &self.raw.id).await?;
        Ok(())
    }

    /// Snapshots the volume.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] when the backend rejects the
    /// request.
    pub async fn create_snapshot(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Snapshot, CloudError> {
        let request = SnapshotCreate {
            volume_id: self.raw.id.clone(),
            name: name.to_owned(),
            description: description.map(str::to_owned),
        };
        info!(volume_id = %self.raw.id, name, "creating snapshot");
        let raw = self.context.storage.create_snapshot(&request).await?;
        Ok(self.context.snapshot(raw))
    }

    /// Deletes the volume.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] when the backend rejects the
    /// request for any reason other than the volume already being gone.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(volume_id = %self.raw.id, "deleting volume");
        idempotent_delete(self.context.storage.delete_volume(&self.raw.id).await)
    }
}

impl Identified for Volume {
    fn id(&self) -> &str {
        &self.raw.id
    }
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume").field("raw", &self.raw).finish()
    }
}

/// Normalised state of a snapshot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SnapshotState {
    /// Being taken.
    Pending,
    /// Usable as a volume source.
    Available,
    /// Being deleted.
    Deleting,
    /// Failed.
    Error,
    /// Any status this layer does not recognise.
    Unknown,
}

impl SnapshotState {
    fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "creating" => Self::Pending,
            "available" => Self::Available,
            "deleting" => Self::Deleting,
            "error" | "error_deleting" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Point-in-time copy of a volume.
#[derive(Clone)]
pub struct Snapshot {
    raw: RawSnapshot,
    context: BlockContext,
}

impl Snapshot {
    /// Display name; empty when the snapshot is unnamed.
    #[must_use]
    pub fn name(&self) -> &str {
        self.raw.name.as_deref().unwrap_or_default()
    }

    /// Volume the snapshot was taken from.
    #[must_use]
    pub fn volume_id(&self) -> &str {
        &self.raw.volume_id
    }

    /// Normalised state.
    #[must_use]
    pub fn state(&self) -> SnapshotState {
        SnapshotState::from_status(&self.raw.status)
    }

    /// Size in GiB.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.raw.size
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.raw.description.as_deref()
    }

    /// Creation timestamp as reported by the provider.
    #[must_use]
    pub fn create_time(&self) -> Option<&str> {
        self.raw.created_at.as_deref()
    }

    /// Restores the snapshot into a new volume in `zone`.
    ///
    /// The new volume takes the snapshot's size unless `size` is given.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero size, or
    /// [`CloudError::BlockStorage`] when the backend rejects the request.
    pub async fn create_volume<'a>(
        &self,
        name: &str,
        zone: impl Into<ZoneRef<'a>>,
        size: Option<u64>,
    ) -> Result<Volume, CloudError> {
        let request = VolumeCreate {
            name: name.to_owned(),
            size: check_volume_size(size.unwrap_or(self.raw.size))?,
            availability_zone: zone.into().as_identifier().to_owned(),
            snapshot_id: Some(self.raw.id.clone()),
            description: None,
        };
        info!(snapshot_id = %self.raw.id, name, "restoring snapshot into volume");
        let raw = self.context.storage.create_volume(&request).await?;
        Ok(self.context.volume(raw))
    }

    /// Deletes the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] when the backend rejects the
    /// request for any reason other than the snapshot already being gone.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(snapshot_id = %self.raw.id, "deleting snapshot");
        idempotent_delete(self.context.storage.delete_snapshot(&self.raw.id).await)
    }
}

impl Identified for Snapshot {
    fn id(&self) -> &str {
        &self.raw.id
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot").field("raw", &self.raw).finish()
    }
}
