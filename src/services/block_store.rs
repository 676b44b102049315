//! Block-storage services: volumes and snapshots.

use tracing::{debug, info};

use crate::backend::{ListQuery, SnapshotCreate, VolumeCreate};
use crate::error::{CloudError, OrAbsent, check_limit, check_volume_size};
use crate::paging::PagedResults;
use crate::resources::{BlockContext, Snapshot, SnapshotRef, Volume, VolumeRef, ZoneRef};

/// Block-storage namespace of a provider.
#[derive(Clone, Debug)]
pub struct BlockStoreService {
    volumes: VolumeService,
    snapshots: SnapshotService,
}

impl BlockStoreService {
    pub(crate) fn new(context: BlockContext) -> Self {
        Self {
            volumes: VolumeService {
                context: context.clone(),
            },
            snapshots: SnapshotService { context },
        }
    }

    /// Volume operations.
    #[must_use]
    pub const fn volumes(&self) -> &VolumeService {
        &self.volumes
    }

    /// Snapshot operations.
    #[must_use]
    pub const fn snapshots(&self) -> &SnapshotService {
        &self.snapshots
    }
}

/// Volume operations.
#[derive(Clone)]
pub struct VolumeService {
    context: BlockContext,
}

impl VolumeService {
    /// Returns the volume with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] for any failure other than
    /// not-found.
    pub async fn get(&self, id: &str) -> Result<Option<Volume>, CloudError> {
        let raw = self.context.storage.get_volume(id).await.or_absent()?;
        Ok(raw.map(|raw| self.context.volume(raw)))
    }

    /// Volume search is not offered by this provider.
    ///
    /// # Errors
    ///
    /// Always returns [`CloudError::Unsupported`].
    #[expect(clippy::unused_async, reason = "keeps find awaitable like the other operations")]
    pub async fn find(&self, _name: &str) -> Result<Vec<Volume>, CloudError> {
        Err(CloudError::unsupported("find_volume"))
    }

    /// Lists volumes one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<Volume>, CloudError> {
        let page_size = check_limit(limit)?;
        let query = ListQuery::new(page_size.map(|size| size.saturating_add(1)), marker);
        let volumes = self
            .context
            .storage
            .list_volumes(query)
            .await?
            .into_iter()
            .map(|raw| self.context.volume(raw))
            .collect();
        Ok(PagedResults::server_paged(volumes, page_size))
    }

    /// Creates a volume of `size` GiB in `zone`, optionally restored from a
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero size, or the backend
    /// failure.
    pub async fn create<'a>(
        &self,
        name: &str,
        size: u64,
        zone: impl Into<ZoneRef<'a>>,
        snapshot: Option<SnapshotRef<'a>>,
        description: Option<&str>,
    ) -> Result<Volume, CloudError> {
        let request = VolumeCreate {
            name: name.to_owned(),
            size: check_volume_size(size)?,
            availability_zone: zone.into().as_identifier().to_owned(),
            snapshot_id: snapshot.map(|snapshot| snapshot.as_identifier().to_owned()),
            description: description.map(str::to_owned),
        };
        info!(name, size, zone = %request.availability_zone, "creating volume");
        let raw = self.context.storage.create_volume(&request).await?;
        Ok(self.context.volume(raw))
    }

    /// Deletes the volume with `id`; an absent volume counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] when the backend rejects the
    /// delete.
    pub async fn delete(&self, id: &str) -> Result<bool, CloudError> {
        match self.get(id).await? {
            Some(volume) => volume.delete().await,
            None => {
                debug!(volume_id = id, "volume already absent");
                Ok(true)
            }
        }
    }
}

impl std::fmt::Debug for VolumeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeService").finish_non_exhaustive()
    }
}

/// Snapshot operations.
#[derive(Clone)]
pub struct SnapshotService {
    context: BlockContext,
}

impl SnapshotService {
    /// Returns the snapshot with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] for any failure other than
    /// not-found.
    pub async fn get(&self, id: &str) -> Result<Option<Snapshot>, CloudError> {
        let raw = self.context.storage.get_snapshot(id).await.or_absent()?;
        Ok(raw.map(|raw| self.context.snapshot(raw)))
    }

    /// Snapshot search is not offered by this provider.
    ///
    /// # Errors
    ///
    /// Always returns [`CloudError::Unsupported`].
    #[expect(clippy::unused_async, reason = "keeps find awaitable like the other operations")]
    pub async fn find(&self, _name: &str) -> Result<Vec<Snapshot>, CloudError> {
        Err(CloudError::unsupported("find_snapshot"))
    }

    /// Lists snapshots one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<Snapshot>, CloudError> {
        let page_size = check_limit(limit)?;
        let query = ListQuery::new(page_size.map(|size| size.saturating_add(1)), marker);
        let snapshots = self
            .context
            .storage
            .list_snapshots(query)
            .await?
            .into_iter()
            .map(|raw| self.context.snapshot(raw))
            .collect();
        Ok(PagedResults::server_paged(snapshots, page_size))
    }

    /// Snapshots `volume`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] when the backend rejects the
    /// request.
    pub async fn create<'a>(
        &self,
        name: &str,
        volume: impl Into<VolumeRef<'a>>,
        description: Option<&str>,
    ) -> Result<Snapshot, CloudError> {
        let request = SnapshotCreate {
            volume_id: volume.into().as_identifier().to_owned(),
            name: name.to_owned(),
            description: description.map(str::to_owned),
        };
        info!(name, volume_id = %request.volume_id, "creating snapshot");
        let raw = self.context.storage.create_snapshot(&request).await?;
        Ok(self.context.snapshot(raw))
    }

    /// Deletes the snapshot with `id`; an absent snapshot counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::BlockStorage`] when the backend rejects the
    /// delete.
    pub async fn delete(&self, id: &str) -> Result<bool, CloudError> {
        match self.get(id).await? {
            Some(snapshot) => snapshot.delete().await,
            None => {
                debug!(snapshot_id = id, "snapshot already absent");
                Ok(true)
            }
        }
    }
}

impl std::fmt::Debug for SnapshotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotService").finish_non_exhaustive()
    }
}
