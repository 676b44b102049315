//! Block-storage (cinder v3) client.

use serde::{Deserialize, Serialize};

use crate::backend::{
    BackendFuture, BlockStorageBackend, BlockStorageError, ListQuery, RawSnapshot, RawVolume,
    SnapshotCreate, VolumeCreate,
};

use super::http::{HttpFailure, RestClient, paging_query};

/// Block-storage client speaking the cinder v3 API.
#[derive(Clone, Debug)]
pub struct BlockStorageClient {
    rest: RestClient,
}

impl BlockStorageClient {
    pub(crate) const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

fn failed(err: HttpFailure) -> BlockStorageError {
    err.provider()
}

fn missing<'a>(
    resource: &'a str,
    id: &'a str,
) -> impl FnOnce(HttpFailure) -> BlockStorageError + 'a {
    move |err| err.lookup(resource, id)
}

#[derive(Deserialize)]
struct Volumes {
    volumes: Vec<RawVolume>,
}

#[derive(Deserialize, Serialize)]
struct Volume<T = RawVolume> {
    volume: T,
}

#[derive(Serialize)]
struct NewVolume<'a> {
    name: &'a str,
    size: u64,
    availability_zone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct Snapshots {
    snapshots: Vec<RawSnapshot>,
}

#[derive(Deserialize, Serialize)]
struct Snapshot<T = RawSnapshot> {
    snapshot: T,
}

#[derive(Serialize)]
struct NewSnapshot<'a> {
    volume_id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    /// Allows snapshotting a volume that is attached to a server.
    force: bool,
}

impl BlockStorageBackend for BlockStorageClient {
    fn list_volumes(
        &self,
        query: ListQuery,
    ) -> BackendFuture<'_, Vec<RawVolume>, BlockStorageError> {
        Box::pin(async move {
            let params = paging_query(query.limit, query.marker.as_deref());
            let body: Volumes = self
                .rest
                .get_json(&["volumes", "detail"], &params)
                .await
                .map_err(failed)?;
            Ok(body.volumes)
        })
    }

    fn get_volume<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawVolume, BlockStorageError> {
        Box::pin(async move {
            let body: Volume = self
                .rest
                .get_json(&["volumes", id], &[])
                .await
                .map_err(missing("volume", id))?;
            Ok(body.volume)
        })
    }

    fn create_volume<'a>(
        &'a self,
        request: &'a VolumeCreate,
    ) -> BackendFuture<'a, RawVolume, BlockStorageError> {
        Box::pin(async move {
            let payload = Volume {
                volume: NewVolume {
                    name: &request.name,
                    size: request.size,
                    availability_zone: &request.availability_zone,
                    snapshot_id: request.snapshot_id.as_deref(),
                    description: request.description.as_deref(),
                },
            };
            let body: Volume = self
                .rest
                .post_json(&["volumes"], &payload)
                .await
                .map_err(failed)?;
            Ok(body.volume)
        })
    }

    fn delete_volume<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), BlockStorageError> {
        Box::pin(async move {
            self.rest
                .delete(&["volumes", id])
                .await
                .map_err(missing("volume", id))
        })
    }

    fn list_snapshots(
        &self,
        query: ListQuery,
    ) -> BackendFuture<'_, Vec<RawSnapshot>, BlockStorageError> {
        Box::pin(async move {
            let params = paging_query(query.limit, query.marker.as_deref());
            let body: Snapshots = self
                .rest
                .get_json(&["snapshots", "detail"], &params)
                .await
                .map_err(failed)?;
            Ok(body.snapshots)
        })
    }

    fn get_snapshot<'a>(
        &'a self,
        id: &'a str,
    ) -> BackendFuture<'a, RawSnapshot, BlockStorageError> {
        Box::pin(async move {
            let body: Snapshot = self
                .rest
                .get_json(&["snapshots", id], &[])
                .await
                .map_err(missing("snapshot", id))?;
            Ok(body.snapshot)
        })
    }

    fn create_snapshot<'a>(
        &'a self,
        request: &'a SnapshotCreate,
    ) -> BackendFuture<'a, RawSnapshot, BlockStorageError> {
        Box::pin(async move {
            let payload = Snapshot {
                snapshot: NewSnapshot {
                    volume_id: &request.volume_id,
                    name: &request.name,
                    description: request.description.as_deref(),
                    force: true,
                },
            };
            let body: Snapshot = self
                .rest
                .post_json(&["snapshots"], &payload)
                .await
                .map_err(missing("volume", &request.volume_id))?;
            Ok(body.snapshot)
        })
    }

    fn delete_snapshot<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), BlockStorageError> {
        Box::pin(async move {
            self.rest
                .delete(&["snapshots", id])
                .await
                .map_err(missing("snapshot", id))
        })
    }
}
