//! Tests for launch configurations flowing into instance creation.

use std::sync::Arc;

use rstest::*;
use stratum::backend::RawFlavor;
use stratum::launch::{DestinationType, ROOT_DEVICE_NAME, SourceType};
use stratum::test_support::{InMemoryBlockStorage, InMemoryCompute};
use stratum::{
    CloudProvider, DeviceSource, Identified, InstanceSpec, LaunchConfig, LaunchConfigError,
};

#[fixture]
fn compute() -> Arc<InMemoryCompute> {
    let compute = InMemoryCompute::default();
    compute.add_flavor(RawFlavor {
        id: String::from("3"),
        name: String::from("m1.medium"),
        ..RawFlavor::default()
    });
    Arc::new(compute)
}

#[rstest]
#[tokio::test]
async fn launch_config_reaches_the_backend(compute: Arc<InMemoryCompute>) {
    let provider = CloudProvider::builder()
        .compute(Arc::clone(&compute) as _)
        .block_storage(Arc::new(InMemoryBlockStorage::default()))
        .build();
    let block_store = provider.block_store().expect("block store wired");
    let volume = block_store
        .volumes()
        .create("seed", 8, "nova", None, None)
        .await
        .expect("volume");
    let snapshot = block_store
        .snapshots()
        .create("seed-snap", &volume, None)
        .await
        .expect("snapshot");

    let instances = provider.compute().expect("compute wired").instances();
    let mut config = instances.create_launch_config();
    config
        .add_volume_device(Some(DeviceSource::from(&snapshot)), true, Some(16), Some(false))
        .expect("root from snapshot");
    config
        .add_volume_device(None, false, Some(4), None)
        .expect("blank data volume");
    config.add_ephemeral_device().add_network_interface("net-a");

    instances
        .create(InstanceSpec::new("db-1", "img-1", "m1.medium").launch_config(&config))
        .await
        .expect("create");

    let request = compute.last_server_create().expect("create recorded");
    assert_eq!(request.flavor_id, "3");
    assert_eq!(request.block_devices.len(), 3);

    let root = &request.block_devices[0];
    assert_eq!(root.device_name.as_deref(), Some(ROOT_DEVICE_NAME));
    assert_eq!(root.source_type, SourceType::Snapshot);
    assert_eq!(root.uuid.as_deref(), Some(snapshot.id()));
    assert_eq!(root.delete_on_termination, Some(false));
    assert_eq!(root.volume_size, Some(16));

    let blank = &request.block_devices[1];
    assert_eq!(blank.device_name, None);
    assert_eq!(blank.source_type, SourceType::Blank);
    assert_eq!(blank.destination_type, DestinationType::Volume);

    let ephemeral = &request.block_devices[2];
    assert_eq!(ephemeral.destination_type, DestinationType::Local);
    assert_eq!(ephemeral.delete_on_termination, Some(true));

    let networks: Vec<_> = request.networks.iter().map(|nic| nic.net_id.as_str()).collect();
    assert_eq!(networks, ["net-a"]);
}

#[rstest]
fn second_root_device_is_rejected() {
    let mut config = LaunchConfig::new();
    config
        .add_volume_device(Some(DeviceSource::Image(String::from("img-1"))), true, None, None)
        .expect("first root");
    let err = config
        .add_volume_device(Some(DeviceSource::Volume(String::from("vol-1"))), true, None, None)
        .expect_err("second root");
    assert_eq!(err, LaunchConfigError::DuplicateRoot);
    assert_eq!(config.block_devices().len(), 1);
}

#[rstest]
#[case(None, LaunchConfigError::BlankVolumeWithoutSize)]
#[case(Some(0), LaunchConfigError::ZeroSize)]
fn invalid_blank_volume_sizes(#[case] size: Option<u64>, #[case] expected: LaunchConfigError) {
    let mut config = LaunchConfig::new();
    let err = config
        .add_volume_device(None, false, size, None)
        .expect_err("invalid size");
    assert_eq!(err, expected);
    assert!(config.block_devices().is_empty());
}

#[rstest]
#[tokio::test]
async fn instance_without_launch_config_sends_no_devices(compute: Arc<InMemoryCompute>) {
    let provider = CloudProvider::builder()
        .compute(Arc::clone(&compute) as _)
        .build();
    provider
        .compute()
        .expect("compute wired")
        .instances()
        .create(InstanceSpec::new("bare", "img-1", "3"))
        .await
        .expect("create by flavor id");
    let request = compute.last_server_create().expect("create recorded");
    assert!(request.block_devices.is_empty());
    assert!(request.networks.is_empty());
    assert_eq!(request.flavor_id, "3");
}
