//! Launch configuration: block devices and network interfaces requested for
//! a new instance.
//!
//! A [`LaunchConfig`] is a declarative request builder. Instance creation
//! reads it once and translates it into the backend's block-device-mapping
//! and network-interface wire entries.

use serde::Serialize;
use thiserror::Error;

use crate::resources::{Identified, MachineImage, Snapshot, Volume};

/// Device path pinned for the root volume.
pub const ROOT_DEVICE_NAME: &str = "/dev/sda";

/// Errors raised while assembling a launch configuration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LaunchConfigError {
    /// Raised when a blank volume is requested without a size.
    #[error("a size must be specified for a blank new volume")]
    BlankVolumeWithoutSize,
    /// Raised when a second device is marked as root.
    #[error("an existing block device was already marked as root")]
    DuplicateRoot,
    /// Raised when a zero size is requested.
    #[error("volume size must be greater than zero")]
    ZeroSize,
}

/// Existing resource a volume-backed device is populated from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeviceSource {
    /// Restore from a volume snapshot.
    Snapshot(String),
    /// Clone an existing volume.
    Volume(String),
    /// Copy a machine image onto the volume.
    Image(String),
}

impl From<&Snapshot> for DeviceSource {
    fn from(value: &Snapshot) -> Self {
        Self::Snapshot(value.id().to_owned())
    }
}

impl From<&Volume> for DeviceSource {
    fn from(value: &Volume) -> Self {
        Self::Volume(value.id().to_owned())
    }
}

impl From<&MachineImage> for DeviceSource {
    fn from(value: &MachineImage) -> Self {
        Self::Image(value.id().to_owned())
    }
}

/// One requested block device.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockDeviceSpec {
    /// Source for a volume-backed device; `None` means a blank volume.
    pub source: Option<DeviceSource>,
    /// `true` for a volume-backed device, `false` for local ephemeral storage.
    pub is_volume: bool,
    /// Marks the boot device.
    pub is_root: bool,
    /// Requested size in GiB.
    pub size: Option<u64>,
    /// Whether the volume is removed with the instance; unset defers to the
    /// backend default. Ignored for ephemeral devices.
    pub delete_on_terminate: Option<bool>,
}

/// Block devices and networks requested for an instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LaunchConfig {
    block_devices: Vec<BlockDeviceSpec>,
    network_interfaces: Vec<String>,
}

impl LaunchConfig {
    /// Creates an empty launch configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a volume-backed device.
    ///
    /// With `source` unset a blank volume of `size` GiB is created.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchConfigError`] when a blank volume has no size, when a
    /// root device already exists, or when `size` is zero.
    pub fn add_volume_device(
        &mut self,
        source: Option<DeviceSource>,
        is_root: bool,
        size: Option<u64>,
        delete_on_terminate: Option<bool>,
    ) -> Result<&mut Self, LaunchConfigError> {
        self.add_block_device(BlockDeviceSpec {
            source,
            is_volume: true,
            is_root,
            size,
            delete_on_terminate,
        })
    }

    /// Adds a local ephemeral device, always reclaimed on termination.
    pub fn add_ephemeral_device(&mut self) -> &mut Self {
        self.block_devices.push(BlockDeviceSpec::default());
        self
    }

    /// Adds a device described in full.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchConfigError`] under the same rules as
    /// [`LaunchConfig::add_volume_device`].
    pub fn add_block_device(
        &mut self,
        device: BlockDeviceSpec,
    ) -> Result<&mut Self, LaunchConfigError> {
        if device.size == Some(0) {
            return Err(LaunchConfigError::ZeroSize);
        }
        if device.is_volume && device.source.is_none() && device.size.is_none() {
            return Err(LaunchConfigError::BlankVolumeWithoutSize);
        }
        if device.is_root && self.block_devices.iter().any(|existing| existing.is_root) {
            return Err(LaunchConfigError::DuplicateRoot);
        }
        self.block_devices.push(device);
        Ok(self)
    }

    /// Attaches the instance to a network; order determines guest NIC order.
    pub fn add_network_interface(&mut self, net_id: impl Into<String>) -> &mut Self {
        self.network_interfaces.push(net_id.into());
        self
    }

    /// Requested block devices in insertion order.
    #[must_use]
    pub fn block_devices(&self) -> &[BlockDeviceSpec] {
        &self.block_devices
    }

    /// Requested network ids in insertion order.
    #[must_use]
    pub fn network_interfaces(&self) -> &[String] {
        &self.network_interfaces
    }
}

/// Source kind of a block-device-mapping entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Empty device.
    Blank,
    /// Volume snapshot.
    Snapshot,
    /// Existing volume.
    Volume,
    /// Machine image.
    Image,
}

/// Destination kind of a block-device-mapping entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    /// Block-storage volume.
    Volume,
    /// Hypervisor-local disk.
    Local,
}

/// Block-device-mapping wire entry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BlockDeviceMapping {
    /// Device path; unset lets the backend assign one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Where the device content comes from.
    pub source_type: SourceType,
    /// Where the device lives.
    pub destination_type: DestinationType,
    /// Identifier of the source resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Whether the device is removed with the instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_on_termination: Option<bool>,
    /// Requested size in GiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_size: Option<u64>,
}

/// Network-interface wire entry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NetworkInterface {
    /// Network to attach.
    #[serde(rename = "uuid")]
    pub net_id: String,
}

fn to_mapping(device: &BlockDeviceSpec) -> BlockDeviceMapping {
    if !device.is_volume {
        return BlockDeviceMapping {
            device_name: None,
            source_type: SourceType::Blank,
            destination_type: DestinationType::Local,
            uuid: None,
            delete_on_termination: Some(true),
            volume_size: None,
        };
    }
    let (source_type, uuid) = match &device.source {
        Some(DeviceSource::Snapshot(id)) => (SourceType::Snapshot, Some(id.clone())),
        Some(DeviceSource::Volume(id)) => (SourceType::Volume, Some(id.clone())),
        Some(DeviceSource::Image(id)) => (SourceType::Image, Some(id.clone())),
        None => (SourceType::Blank, None),
    };
    BlockDeviceMapping {
        device_name: device.is_root.then(|| ROOT_DEVICE_NAME.to_owned()),
        source_type,
        destination_type: DestinationType::Volume,
        uuid,
        delete_on_termination: device.delete_on_terminate,
        volume_size: device.size,
    }
}

/// Translates the requested devices into wire entries, preserving order.
#[must_use]
pub fn block_device_mappings(config: &LaunchConfig) -> Vec<BlockDeviceMapping> {
    config.block_devices.iter().map(to_mapping).collect()
}

/// Translates the requested networks into wire entries, preserving order.
#[must_use]
pub fn network_interfaces(config: &LaunchConfig) -> Vec<NetworkInterface> {
    config
        .network_interfaces
        .iter()
        .map(|net_id| NetworkInterface {
            net_id: net_id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn config() -> LaunchConfig {
        LaunchConfig::new()
    }

    #[rstest]
    fn root_snapshot_volume_pins_root_device(mut config: LaunchConfig) {
        config
            .add_volume_device(
                Some(DeviceSource::Snapshot(String::from("snap-1"))),
                true,
                None,
                Some(true),
            )
            .expect("valid device");
        let mappings = block_device_mappings(&config);
        assert_eq!(
            mappings,
            vec![BlockDeviceMapping {
                device_name: Some(String::from(ROOT_DEVICE_NAME)),
                source_type: SourceType::Snapshot,
                destination_type: DestinationType::Volume,
                uuid: Some(String::from("snap-1")),
                delete_on_termination: Some(true),
                volume_size: None,
            }]
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(false))]
    #[case(Some(true))]
    fn local_device_is_always_reclaimed(mut config: LaunchConfig, #[case] requested: Option<bool>) {
        config
            .add_block_device(BlockDeviceSpec {
                delete_on_terminate: requested,
                ..BlockDeviceSpec::default()
            })
            .expect("valid device");
        let mapping = &block_device_mappings(&config)[0];
        assert_eq!(mapping.destination_type, DestinationType::Local);
        assert_eq!(mapping.source_type, SourceType::Blank);
        assert_eq!(mapping.delete_on_termination, Some(true));
    }

    #[rstest]
    #[case(DeviceSource::Volume(String::from("vol-1")), SourceType::Volume)]
    #[case(DeviceSource::Image(String::from("img-1")), SourceType::Image)]
    fn source_kind_follows_source(
        mut config: LaunchConfig,
        #[case] source: DeviceSource,
        #[case] expected: SourceType,
    ) {
        config
            .add_volume_device(Some(source), false, Some(10), None)
            .expect("valid device");
        let mapping = &block_device_mappings(&config)[0];
        assert_eq!(mapping.source_type, expected);
        assert_eq!(mapping.device_name, None);
        assert_eq!(mapping.delete_on_termination, None);
        assert_eq!(mapping.volume_size, Some(10));
    }

    #[rstest]
    fn blank_volume_requires_size(mut config: LaunchConfig) {
        let err = config
            .add_volume_device(None, false, None, None)
            .expect_err("blank volume without size");
        assert_eq!(err, LaunchConfigError::BlankVolumeWithoutSize);
        assert!(config.block_devices().is_empty());
    }

    #[rstest]
    fn second_root_is_rejected(mut config: LaunchConfig) {
        config
            .add_volume_device(None, true, Some(20), None)
            .expect("first root");
        let err = config
            .add_volume_device(None, true, Some(20), None)
            .expect_err("second root");
        assert_eq!(err, LaunchConfigError::DuplicateRoot);
    }

    #[rstest]
    fn zero_size_is_rejected(mut config: LaunchConfig) {
        let err = config
            .add_volume_device(Some(DeviceSource::Image(String::from("img"))), false, Some(0), None)
            .expect_err("zero size");
        assert_eq!(err, LaunchConfigError::ZeroSize);
    }

    #[rstest]
    fn networks_keep_their_order(mut config: LaunchConfig) {
        config.add_network_interface("net-b").add_network_interface("net-a");
        let ids: Vec<_> = network_interfaces(&config)
            .into_iter()
            .map(|nic| nic.net_id)
            .collect();
        assert_eq!(ids, ["net-b", "net-a"]);
    }

    #[rstest]
    fn wire_form_omits_unset_fields(mut config: LaunchConfig) {
        config.add_ephemeral_device();
        let json = serde_json::to_value(block_device_mappings(&config)).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!([{
                "source_type": "blank",
                "destination_type": "local",
                "delete_on_termination": true,
            }])
        );
    }
}
