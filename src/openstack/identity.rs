//! Identity (keystone v3) client used for the service catalog.

use serde::Deserialize;

use crate::backend::{BackendFuture, CatalogBackend, CatalogError, CatalogService};

use super::http::RestClient;

/// Catalog client speaking the keystone v3 API.
#[derive(Clone, Debug)]
pub struct IdentityClient {
    rest: RestClient,
}

impl IdentityClient {
    pub(crate) const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[derive(Deserialize)]
struct Catalog {
    #[serde(default)]
    catalog: Vec<CatalogService>,
}

impl CatalogBackend for IdentityClient {
    fn service_catalog(&self) -> BackendFuture<'_, Vec<CatalogService>, CatalogError> {
        Box::pin(async move {
            let body: Catalog = self
                .rest
                .get_json(&["auth", "catalog"], &[])
                .await
                .map_err(|err| err.provider::<CatalogError>())?;
            Ok(body.catalog)
        })
    }
}
