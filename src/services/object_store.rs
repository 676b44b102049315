//! Object-storage service: buckets.

use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::{ContainerQuery, ObjectStorageBackend, ObjectStorageError};
use crate::error::{CloudError, OrAbsent, check_limit};
use crate::paging::PagedResults;
use crate::resources::Bucket;

/// Bucket operations.
#[derive(Clone)]
pub struct ObjectStoreService {
    storage: Arc<dyn ObjectStorageBackend>,
}

impl ObjectStoreService {
    pub(crate) fn new(storage: Arc<dyn ObjectStorageBackend>) -> Self {
        Self { storage }
    }

    /// Returns the bucket named exactly `name`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when listing fails.
    pub async fn get(&self, name: &str) -> Result<Option<Bucket>, CloudError> {
        let query = ContainerQuery {
            prefix: Some(name.to_owned()),
            ..ContainerQuery::default()
        };
        let containers = self
            .storage
            .list_containers(query)
            .await
            .or_absent()?
            .unwrap_or_default();
        Ok(containers
            .into_iter()
            .find(|container| container.name == name)
            .map(|raw| Bucket::new(raw, Arc::clone(&self.storage))))
    }

    /// Bucket search is not offered by this provider.
    ///
    /// # Errors
    ///
    /// Always returns [`CloudError::Unsupported`].
    #[expect(clippy::unused_async, reason = "keeps find awaitable like the other operations")]
    pub async fn find(&self, _name: &str) -> Result<Vec<Bucket>, CloudError> {
        Err(CloudError::unsupported("find_bucket"))
    }

    /// Lists buckets one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<Bucket>, CloudError> {
        let page_size = check_limit(limit)?;
        let query = ContainerQuery {
            prefix: None,
            limit: page_size.map(|size| size.saturating_add(1)),
            marker: marker.map(str::to_owned),
        };
        let buckets = self
            .storage
            .list_containers(query)
            .await?
            .into_iter()
            .map(|raw| Bucket::new(raw, Arc::clone(&self.storage)))
            .collect();
        Ok(PagedResults::server_paged(buckets, page_size))
    }

    /// Creates a bucket named `name`, or returns it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for an empty name, the backend
    /// failure, or [`CloudError::ObjectStorage`] when the new bucket does
    /// not show up in the listing.
    pub async fn create(&self, name: &str) -> Result<Bucket, CloudError> {
        if name.is_empty() {
            return Err(CloudError::Validation(String::from(
                "bucket name must not be empty",
            )));
        }
        info!(bucket = name, "creating bucket");
        self.storage.create_container(name).await?;
        self.get(name).await?.ok_or_else(|| {
            ObjectStorageError::Provider {
                message: format!("bucket {name} missing after creation"),
            }
            .into()
        })
    }

    /// Deletes the bucket named `name`; an absent bucket counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when the backend rejects the
    /// delete, for example because the bucket still holds objects.
    pub async fn delete(&self, name: &str) -> Result<bool, CloudError> {
        match self.get(name).await? {
            Some(bucket) => bucket.delete().await,
            None => {
                debug!(bucket = name, "bucket already absent");
                Ok(true)
            }
        }
    }
}

impl std::fmt::Debug for ObjectStoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Identified;
    use crate::test_support::InMemoryObjectStorage;
    use rstest::{fixture, rstest};

    #[fixture]
    fn backend() -> Arc<InMemoryObjectStorage> {
        Arc::new(InMemoryObjectStorage::default())
    }

    fn service(backend: &Arc<InMemoryObjectStorage>) -> ObjectStoreService {
        ObjectStoreService::new(Arc::clone(backend) as Arc<dyn ObjectStorageBackend>)
    }

    #[rstest]
    #[tokio::test]
    async fn get_requires_exact_name(backend: Arc<InMemoryObjectStorage>) {
        let store = service(&backend);
        store.create("logs-archive").await.expect("create");
        assert!(store.get("logs").await.expect("get").is_none());
        let found = store.get("logs-archive").await.expect("get").expect("present");
        assert_eq!(found.id(), "logs-archive");
    }

    #[rstest]
    #[tokio::test]
    async fn objects_upload_and_download(backend: Arc<InMemoryObjectStorage>) {
        let store = service(&backend);
        let bucket = store.create("assets").await.expect("create");
        bucket
            .objects()
            .upload("index.html", b"<html/>".to_vec())
            .await
            .expect("upload");
        let object = bucket
            .objects()
            .get("index.html")
            .await
            .expect("get")
            .expect("present");
        assert_eq!(object.size(), 7);
        assert_eq!(object.download().await.expect("download"), b"<html/>");
        assert_eq!(object.delete().await, Ok(true));
        assert!(bucket.objects().get("index.html").await.expect("get").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn object_listing_pages_by_name(backend: Arc<InMemoryObjectStorage>) {
        let store = service(&backend);
        let bucket = store.create("assets").await.expect("create");
        for name in ["a", "b", "c"] {
            bucket.objects().create(name).await.expect("create object");
        }
        let first = bucket.objects().list(None, Some(2), None).await.expect("list");
        assert_eq!(first.next_marker(), Some("b"));
        let second = bucket
            .objects()
            .list(None, Some(2), first.next_marker())
            .await
            .expect("list");
        let names: Vec<_> = second.iter().map(|object| object.name()).collect();
        assert_eq!(names, ["c"]);
        assert!(!second.has_more());
    }

    #[rstest]
    #[tokio::test]
    async fn empty_bucket_name_is_rejected(backend: Arc<InMemoryObjectStorage>) {
        assert!(matches!(
            service(&backend).create("").await,
            Err(CloudError::Validation(_))
        ));
    }
}
