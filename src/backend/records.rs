//! Raw records exchanged with backend clients.
//!
//! Field names follow the OpenStack JSON representations so the REST
//! transport can deserialise responses directly. Resource wrappers read
//! through these records and never mutate them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::launch::{BlockDeviceMapping, NetworkInterface};

/// Reference to another resource, as embedded in server records.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawLink {
    /// Identifier of the referenced resource.
    pub id: String,
}

/// Accepts either a `{"id": ..}` object or any other value (nova reports an
/// empty string for the image of a volume-booted server).
fn lenient_link<'de, D>(deserializer: D) -> Result<Option<RawLink>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LinkOrOther {
        Link(RawLink),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<LinkOrOther>::deserialize(deserializer)? {
        Some(LinkOrOther::Link(link)) if !link.id.is_empty() => Some(link),
        _ => None,
    })
}

/// Named reference, as used for server security groups.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawNamed {
    /// Name of the referenced resource.
    pub name: String,
}

/// One address assigned to a server on a network.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawAddress {
    /// IP address in textual form.
    pub addr: String,
    /// IP version (4 or 6).
    #[serde(default)]
    pub version: u8,
    /// Address kind: `fixed` or `floating`.
    #[serde(default, rename = "OS-EXT-IPS:type")]
    pub kind: Option<String>,
}

/// Server record returned by a compute backend.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawServer {
    /// Server identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Provider status string (for example `ACTIVE`).
    #[serde(default)]
    pub status: String,
    /// Boot image, absent for volume-booted servers.
    #[serde(default, deserialize_with = "lenient_link")]
    pub image: Option<RawLink>,
    /// Flavour the server was launched with.
    #[serde(default, deserialize_with = "lenient_link")]
    pub flavor: Option<RawLink>,
    /// Availability zone hosting the server.
    #[serde(default, rename = "OS-EXT-AZ:availability_zone")]
    pub availability_zone: Option<String>,
    /// Key pair injected at boot.
    #[serde(default)]
    pub key_name: Option<String>,
    /// Security groups applied to the server.
    #[serde(default)]
    pub security_groups: Vec<RawNamed>,
    /// Addresses keyed by network name.
    #[serde(default)]
    pub addresses: BTreeMap<String, Vec<RawAddress>>,
}

/// Flavour (instance type) record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawFlavor {
    /// Flavour identifier.
    pub id: String,
    /// Flavour name.
    #[serde(default)]
    pub name: String,
    /// Virtual CPU count.
    #[serde(default)]
    pub vcpus: u32,
    /// Memory in MiB.
    #[serde(default)]
    pub ram: u64,
    /// Root disk size in GiB.
    #[serde(default)]
    pub disk: u64,
    /// Ephemeral disk size in GiB.
    #[serde(default, rename = "OS-FLV-EXT-DATA:ephemeral")]
    pub ephemeral: u64,
    /// Whether the flavour is visible to every project.
    #[serde(default, rename = "os-flavor-access:is_public")]
    pub is_public: Option<bool>,
}

/// Machine image record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawImage {
    /// Image identifier.
    pub id: String,
    /// Image name.
    #[serde(default)]
    pub name: String,
    /// Provider status string (for example `ACTIVE`).
    #[serde(default)]
    pub status: String,
    /// Minimum root disk in GiB.
    #[serde(default, rename = "minDisk")]
    pub min_disk: u64,
    /// Creation timestamp as reported by the provider.
    #[serde(default)]
    pub created: Option<String>,
}

/// Key pair record. `private_key` is only present in create responses.
#[derive(Clone, Default, Deserialize, Eq, PartialEq)]
pub struct RawKeyPair {
    /// Key pair name, which doubles as its identifier.
    pub name: String,
    /// Public key fingerprint.
    #[serde(default)]
    pub fingerprint: String,
    /// OpenSSH public key.
    #[serde(default)]
    pub public_key: String,
    /// Private key material generated by the provider.
    #[serde(default)]
    pub private_key: Option<String>,
}

impl std::fmt::Debug for RawKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawKeyPair")
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Source CIDR of a security group rule.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawIpRange {
    /// CIDR block, absent for group-sourced rules.
    #[serde(default)]
    pub cidr: Option<String>,
}

/// Security group rule record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawSecurityGroupRule {
    /// Rule identifier.
    pub id: String,
    /// Owning security group.
    #[serde(default)]
    pub parent_group_id: String,
    /// Protocol (`tcp`, `udp`, `icmp`), absent for any-protocol rules.
    #[serde(default)]
    pub ip_protocol: Option<String>,
    /// First port of the range.
    #[serde(default)]
    pub from_port: Option<i32>,
    /// Last port of the range.
    #[serde(default)]
    pub to_port: Option<i32>,
    /// Source CIDR.
    #[serde(default)]
    pub ip_range: RawIpRange,
    /// Source group, for group-to-group rules.
    #[serde(default)]
    pub group: Option<RawNamed>,
}

/// Security group record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawSecurityGroup {
    /// Security group identifier.
    pub id: String,
    /// Security group name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Ingress rules attached to the group.
    #[serde(default)]
    pub rules: Vec<RawSecurityGroupRule>,
}

/// Attachment of a volume to a server.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawAttachment {
    /// Server the volume is attached to.
    pub server_id: String,
    /// Device path on the server.
    #[serde(default)]
    pub device: Option<String>,
}

/// Volume record returned by a block-storage backend.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawVolume {
    /// Volume identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Size in GiB.
    #[serde(default)]
    pub size: u64,
    /// Provider status string (for example `available`).
    #[serde(default)]
    pub status: String,
    /// Availability zone hosting the volume.
    #[serde(default)]
    pub availability_zone: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Snapshot the volume was created from.
    #[serde(default)]
    pub snapshot_id: Option<String>,
    /// Creation timestamp as reported by the provider.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Current attachments.
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
}

/// Volume snapshot record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawSnapshot {
    /// Snapshot identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Source volume.
    #[serde(default)]
    pub volume_id: String,
    /// Provider status string.
    #[serde(default)]
    pub status: String,
    /// Size in GiB.
    #[serde(default)]
    pub size: u64,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Creation timestamp as reported by the provider.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Object-storage container record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawContainer {
    /// Container name, which doubles as its identifier.
    pub name: String,
    /// Number of objects stored.
    #[serde(default)]
    pub count: u64,
    /// Total bytes stored.
    #[serde(default)]
    pub bytes: u64,
}

/// Object record inside a container.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawObject {
    /// Object name.
    pub name: String,
    /// Object size in bytes.
    #[serde(default)]
    pub bytes: u64,
    /// Last modification timestamp.
    #[serde(default)]
    pub last_modified: Option<String>,
    /// Content hash.
    #[serde(default)]
    pub hash: Option<String>,
    /// Content type.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// One endpoint advertised by a catalog service.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct CatalogEndpoint {
    /// Region name (keystone v2 and v3).
    #[serde(default)]
    pub region: Option<String>,
    /// Region identifier (keystone v3).
    #[serde(default)]
    pub region_id: Option<String>,
    /// Endpoint URL.
    #[serde(default)]
    pub url: String,
    /// Endpoint interface (`public`, `internal`, `admin`).
    #[serde(default)]
    pub interface: Option<String>,
}

/// One service entry of the identity catalog.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct CatalogService {
    /// Service type (for example `compute`).
    #[serde(default, rename = "type")]
    pub service_type: String,
    /// Service name.
    #[serde(default)]
    pub name: String,
    /// Endpoints advertised by the service.
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// Payload for creating a server.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServerCreate {
    /// Display name.
    pub name: String,
    /// Boot image identifier.
    pub image_id: String,
    /// Flavour identifier.
    pub flavor_id: String,
    /// Target availability zone.
    pub availability_zone: Option<String>,
    /// Key pair name.
    pub key_name: Option<String>,
    /// Security group names.
    pub security_groups: Vec<String>,
    /// Raw user data (the transport handles any encoding).
    pub user_data: Option<String>,
    /// Block device mapping entries.
    pub block_devices: Vec<BlockDeviceMapping>,
    /// Network interface entries.
    pub networks: Vec<NetworkInterface>,
}

/// Payload for creating a volume.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VolumeCreate {
    /// Display name.
    pub name: String,
    /// Size in GiB.
    pub size: u64,
    /// Target availability zone.
    pub availability_zone: String,
    /// Snapshot to restore from.
    pub snapshot_id: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

/// Payload for creating a volume snapshot.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SnapshotCreate {
    /// Source volume.
    pub volume_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
}

/// Payload for adding an ingress rule to a security group.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuleCreate {
    /// Security group receiving the rule.
    pub group_id: String,
    /// Protocol (`tcp`, `udp`, `icmp`).
    pub ip_protocol: String,
    /// First port of the range.
    pub from_port: i32,
    /// Last port of the range.
    pub to_port: i32,
    /// Source CIDR.
    pub cidr: String,
}
