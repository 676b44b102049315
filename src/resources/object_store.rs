//! Object-storage resources: buckets and the objects they hold.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::Identified;
use crate::backend::{ContainerQuery, ObjectStorageBackend, RawContainer, RawObject};
use crate::error::{CloudError, OrAbsent, check_limit, idempotent_delete};
use crate::paging::PagedResults;

/// Object-storage container.
#[derive(Clone)]
pub struct Bucket {
    raw: RawContainer,
    storage: Arc<dyn ObjectStorageBackend>,
}

impl Bucket {
    pub(crate) fn new(raw: RawContainer, storage: Arc<dyn ObjectStorageBackend>) -> Self {
        Self { raw, storage }
    }

    /// Bucket name, which is also its identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Number of objects stored when the record was fetched.
    #[must_use]
    pub const fn object_count(&self) -> u64 {
        self.raw.count
    }

    /// Bytes stored when the record was fetched.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.raw.bytes
    }

    /// Returns a handle for the objects stored in this bucket.
    #[must_use]
    pub fn objects(&self) -> BucketObjects<'_> {
        BucketObjects { bucket: self }
    }

    /// Deletes the bucket. The backend refuses to delete non-empty buckets.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when the backend rejects the
    /// request for any reason other than the bucket already being gone.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(bucket = %self.raw.name, "deleting bucket");
        idempotent_delete(self.storage.delete_container(&self.raw.name).await)
    }
}

impl Identified for Bucket {
    fn id(&self) -> &str {
        &self.raw.name
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket").field("raw", &self.raw).finish()
    }
}

/// Object operations scoped to one bucket.
#[derive(Clone, Copy, Debug)]
pub struct BucketObjects<'a> {
    bucket: &'a Bucket,
}

impl BucketObjects<'_> {
    fn wrap(&self, raw: RawObject) -> BucketObject {
        BucketObject {
            raw,
            container: self.bucket.raw.name.clone(),
            storage: Arc::clone(&self.bucket.storage),
        }
    }

    /// Lists objects, optionally restricted to names starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or the backend
    /// failure otherwise.
    pub async fn list(
        &self,
        prefix: Option<&str>,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<BucketObject>, CloudError> {
        let page_size = check_limit(limit)?;
        let query = ContainerQuery {
            prefix: prefix.map(str::to_owned),
            limit: page_size.map(|size| size.saturating_add(1)),
            marker: marker.map(str::to_owned),
        };
        let objects = self
            .bucket
            .storage
            .list_objects(&self.bucket.raw.name, query)
            .await?
            .into_iter()
            .map(|raw| self.wrap(raw))
            .collect();
        Ok(PagedResults::server_paged(objects, page_size))
    }

    /// Returns the object named exactly `name`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure when listing fails for any reason other
    /// than the bucket being gone.
    pub async fn get(&self, name: &str) -> Result<Option<BucketObject>, CloudError> {
        let query = ContainerQuery {
            prefix: Some(name.to_owned()),
            ..ContainerQuery::default()
        };
        let listed = self
            .bucket
            .storage
            .list_objects(&self.bucket.raw.name, query)
            .await
            .or_absent()?
            .unwrap_or_default();
        Ok(listed
            .into_iter()
            .find(|raw| raw.name == name)
            .map(|raw| self.wrap(raw)))
    }

    /// Creates an empty object named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when the upload fails.
    pub async fn create(&self, name: &str) -> Result<BucketObject, CloudError> {
        self.upload(name, Vec::new()).await
    }

    /// Uploads `content` as object `name`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when the upload fails.
    pub async fn upload(&self, name: &str, content: Vec<u8>) -> Result<BucketObject, CloudError> {
        let size = content.len() as u64;
        info!(bucket = %self.bucket.raw.name, object = name, size, "uploading object");
        self.bucket
            .storage
            .put_object(&self.bucket.raw.name, name, content)
            .await?;
        Ok(self.wrap(RawObject {
            name: name.to_owned(),
            bytes: size,
            ..RawObject::default()
        }))
    }
}

/// Object stored in a bucket.
#[derive(Clone)]
pub struct BucketObject {
    raw: RawObject,
    container: String,
    storage: Arc<dyn ObjectStorageBackend>,
}

impl BucketObject {
    /// Object name, which is also its identifier within the bucket.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Name of the bucket holding the object.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.container
    }

    /// Size in bytes when the record was fetched.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.raw.bytes
    }

    /// Last modification timestamp as reported by the provider.
    #[must_use]
    pub fn last_modified(&self) -> Option<&str> {
        self.raw.last_modified.as_deref()
    }

    /// Downloads the object's content.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when the download fails.
    pub async fn download(&self) -> Result<Vec<u8>, CloudError> {
        Ok(self
            .storage
            .get_object(&self.container, &self.raw.name)
            .await?)
    }

    /// Replaces the object's content.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when the upload fails.
    pub async fn upload(&self, content: Vec<u8>) -> Result<(), CloudError> {
        info!(bucket = %self.container, object = %self.raw.name, "replacing object content");
        self.storage
            .put_object(&self.container, &self.raw.name, content)
            .await?;
        Ok(())
    }

    /// Deletes the object.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::ObjectStorage`] when the backend rejects the
    /// request for any reason other than the object already being gone.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(bucket = %self.container, object = %self.raw.name, "deleting object");
        idempotent_delete(
            self.storage
                .delete_object(&self.container, &self.raw.name)
                .await,
        )
    }
}

impl Identified for BucketObject {
    fn id(&self) -> &str {
        &self.raw.name
    }
}

impl fmt::Debug for BucketObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketObject")
            .field("container", &self.container)
            .field("raw", &self.raw)
            .finish()
    }
}
