//! Compute resources: instances, machine images and instance types.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::{Identified, PlacementZone};
use crate::backend::{ComputeBackend, RawFlavor, RawImage, RawServer};
use crate::error::{CloudError, idempotent_delete};

/// Normalised lifecycle state of an instance.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InstanceState {
    /// Being scheduled or built.
    Pending,
    /// Booted and running.
    Running,
    /// Rebooting.
    Rebooting,
    /// Powered off or suspended.
    Stopped,
    /// Deleted or being deleted.
    Deleted,
    /// Failed to build or run.
    Error,
    /// Any status this layer does not recognise.
    Unknown,
}

impl InstanceState {
    fn from_status(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "BUILD" | "PASSWORD" | "REBUILD" | "MIGRATING" | "RESIZE" | "VERIFY_RESIZE" => {
                Self::Pending
            }
            "ACTIVE" => Self::Running,
            "REBOOT" | "HARD_REBOOT" => Self::Rebooting,
            "SHUTOFF" | "STOPPED" | "SUSPENDED" | "PAUSED" | "SHELVED" | "SHELVED_OFFLOADED" => {
                Self::Stopped
            }
            "DELETED" | "SOFT_DELETED" => Self::Deleted,
            "ERROR" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Virtual machine instance.
#[derive(Clone)]
pub struct Instance {
    raw: RawServer,
    compute: Arc<dyn ComputeBackend>,
}

impl Instance {
    pub(crate) fn new(raw: RawServer, compute: Arc<dyn ComputeBackend>) -> Self {
        Self { raw, compute }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Normalised state at the time the record was fetched.
    #[must_use]
    pub fn state(&self) -> InstanceState {
        InstanceState::from_status(&self.raw.status)
    }

    /// Status string exactly as reported by the provider.
    #[must_use]
    pub fn raw_state(&self) -> &str {
        &self.raw.status
    }

    /// Boot image, absent for instances booted from a volume.
    #[must_use]
    pub fn image_id(&self) -> Option<&str> {
        self.raw.image.as_ref().map(|link| link.id.as_str())
    }

    /// Instance type the instance runs as.
    #[must_use]
    pub fn instance_type_id(&self) -> Option<&str> {
        self.raw.flavor.as_ref().map(|link| link.id.as_str())
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

    /// Key pair injected at boot.
    #[must_use]
    pub fn key_pair_name(&self) -> Option<&str> {
        self.raw.key_name.as_deref()
    }

    /// Names of the security groups applied to the instance.
    #[must_use]
    pub fn security_group_names(&self) -> Vec<&str> {
        self.raw
            .security_groups
            .iter()
            .map(|group| group.name.as_str())
            .collect()
    }

    /// Floating (publicly routable) addresses.
    #[must_use]
    pub fn public_ips(&self) -> Vec<&str> {
        self.addresses_of_kind("floating")
    }

    /// Fixed (private network) addresses.
    #[must_use]
    pub fn private_ips(&self) -> Vec<&str> {
        self.addresses_of_kind("fixed")
    }

    fn addresses_of_kind(&self, kind: &str) -> Vec<&str> {
        self.raw
            .addresses
            .values()
            .flatten()
            .filter(|address| address.kind.as_deref() == Some(kind))
            .map(|address| address.addr.as_str())
            .collect()
    }

    /// Deletes the instance.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when the backend rejects the request
    /// for any reason other than the instance already being gone.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(instance_id = %self.raw.id, "deleting instance");
        idempotent_delete(self.compute.delete_server(&self.raw.id).await)
    }
}

impl Identified for Instance {
    fn id(&self) -> &str {
        &self.raw.id
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("raw", &self.raw).finish()
    }
}

/// Normalised state of a machine image.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MachineImageState {
    /// Being uploaded or saved.
    Pending,
    /// Ready to boot instances from.
    Available,
    /// Failed to save.
    Error,
    /// Any status this layer does not recognise.
    Unknown,
}

impl MachineImageState {
    fn from_status(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "SAVING" | "QUEUED" | "UPLOADING" | "IMPORTING" => Self::Pending,
            "ACTIVE" => Self::Available,
            "ERROR" | "KILLED" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Bootable machine image.
#[derive(Clone)]
pub struct MachineImage {
    raw: RawImage,
    compute: Arc<dyn ComputeBackend>,
}

impl MachineImage {
    pub(crate) fn new(raw: RawImage, compute: Arc<dyn ComputeBackend>) -> Self {
        Self { raw, compute }
    }

    /// Image name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Normalised state.
    #[must_use]
    pub fn state(&self) -> MachineImageState {
        MachineImageState::from_status(&self.raw.status)
    }

    /// Minimum root disk size in GiB required to boot the image.
    #[must_use]
    pub const fn min_disk(&self) -> u64 {
        self.raw.min_disk
    }

    /// Deletes the image.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when the backend rejects the request.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(image_id = %self.raw.id, "deleting machine image");
        idempotent_delete(self.compute.delete_image(&self.raw.id).await)
    }
}

impl Identified for MachineImage {
    fn id(&self) -> &str {
        &self.raw.id
    }
}

impl fmt::Debug for MachineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineImage").field("raw", &self.raw).finish()
    }
}

/// Instance type (flavour) catalog entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceType {
    raw: RawFlavor,
}

impl InstanceType {
    pub(crate) const fn new(raw: RawFlavor) -> Self {
        Self { raw }
    }

    /// Instance type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Virtual CPU count.
    #[must_use]
    pub const fn vcpus(&self) -> u32 {
        self.raw.vcpus
    }

    /// Memory in MiB.
    #[must_use]
    pub const fn ram_mb(&self) -> u64 {
        self.raw.ram
    }

    /// Root disk in GiB.
    #[must_use]
    pub const fn root_disk_gb(&self) -> u64 {
        self.raw.disk
    }

    /// Ephemeral disk in GiB.
    #[must_use]
    pub const fn ephemeral_disk_gb(&self) -> u64 {
        self.raw.ephemeral
    }

    /// Root plus ephemeral disk in GiB.
    #[must_use]
    pub const fn total_disk_gb(&self) -> u64 {
        self.raw.disk.saturating_add(self.raw.ephemeral)
    }

    /// Whether the type is visible to every project; `true` when unreported.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.raw.is_public.unwrap_or(true)
    }
}

impl Identified for InstanceType {
    fn id(&self) -> &str {
        &self.raw.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ACTIVE", InstanceState::Running)]
    #[case("build", InstanceState::Pending)]
    #[case("SHUTOFF", InstanceState::Stopped)]
    #[case("HARD_REBOOT", InstanceState::Rebooting)]
    #[case("ERROR", InstanceState::Error)]
    #[case("SOMETHING_NEW", InstanceState::Unknown)]
    fn instance_state_normalises_status(#[case] status: &str, #[case] expected: InstanceState) {
        assert_eq!(InstanceState::from_status(status), expected);
    }

    #[rstest]
    #[case("ACTIVE", MachineImageState::Available)]
    #[case("SAVING", MachineImageState::Pending)]
    #[case("KILLED", MachineImageState::Error)]
    fn image_state_normalises_status(#[case] status: &str, #[case] expected: MachineImageState) {
        assert_eq!(MachineImageState::from_status(status), expected);
    }

    #[rstest]
    fn instance_type_sums_disks() {
        let flavor = InstanceType::new(RawFlavor {
            id: String::from("2"),
            name: String::from("m1.small"),
            disk: 20,
            ephemeral: 10,
            ..RawFlavor::default()
        });
        assert_eq!(flavor.total_disk_gb(), 30);
        assert!(flavor.is_public());
    }

    #[rstest]
    fn instance_type_disk_total_saturates() {
        let flavor = InstanceType::new(RawFlavor {
            disk: u64::MAX,
            ephemeral: 1,
            ..RawFlavor::default()
        });
        assert_eq!(flavor.total_disk_gb(), u64::MAX);
    }
}
